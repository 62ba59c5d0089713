//! Pruebas de integración del motor: cache, selección de estrategia de
//! energía, optimización end-to-end y orquestación de workflows.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sam_domain::{AlkylGroup, Isostere, SamAnalog};
use sam_engine::energy::{EnergyEstimator, Estimate, ResourceUsage};
use sam_engine::{AnalogOptimizer, EnergyEvaluator, EnergyMethod, EvaluatorConfig, InMemoryCache, InMemoryWorkflowStore, OptimizationCriteria, Orchestrator, RouteOptimizer, ScreeningThresholds, StageStatus, TargetContext, WorkflowSpec, WorkflowStatus, WorkflowStore};

/// Estimador falso que cuenta cuántas veces se lo invoca, para verificar la
/// idempotencia dentro de la ventana de cache.
struct CountingEstimator {
    calls: Arc<AtomicUsize>,
}

impl EnergyEstimator for CountingEstimator {
    fn method(&self) -> EnergyMethod {
        EnergyMethod::Simulated
    }

    fn estimate(&self, _structure: &sam_domain::MolecularStructure) -> Estimate {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Estimate { energy: -123.4,
                   converged: true,
                   iterations: 1,
                   confidence: 0.95,
                   resources: ResourceUsage::none() }
    }
}

fn analog() -> SamAnalog {
    SamAnalog::derive("SAM", AlkylGroup::Methyl, Isostere::Carboxylate, false)
}

#[tokio::test]
async fn cached_evaluation_computes_at_most_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator = EnergyEvaluator::with_estimators(EvaluatorConfig::default(),
                                                     Some(Arc::new(InMemoryCache::new())),
                                                     Box::new(CountingEstimator { calls: calls.clone() }),
                                                     Box::new(CountingEstimator { calls: calls.clone() }));
    let structure = analog().to_structure().unwrap();

    let first = evaluator.evaluate(&structure).await.unwrap();
    let second = evaluator.evaluate(&structure).await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    // El resultado cacheado es idéntico bit a bit, simulation_id incluido.
    assert_eq!(first.simulation_id, second.simulation_id);
    assert_eq!(first.energy, second.energy);
}

#[tokio::test]
async fn distinct_structures_never_share_cache_entries() {
    let calls = Arc::new(AtomicUsize::new(0));
    let evaluator = EnergyEvaluator::with_estimators(EvaluatorConfig::default(),
                                                     Some(Arc::new(InMemoryCache::new())),
                                                     Box::new(CountingEstimator { calls: calls.clone() }),
                                                     Box::new(CountingEstimator { calls: calls.clone() }));
    let a = SamAnalog::derive("SAM", AlkylGroup::Methyl, Isostere::Amide, false).to_structure().unwrap();
    let b = SamAnalog::derive("SAM", AlkylGroup::Allyl, Isostere::Amide, false).to_structure().unwrap();

    evaluator.evaluate(&a).await.unwrap();
    evaluator.evaluate(&b).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn large_analogs_fall_back_to_the_classical_path() {
    let evaluator = EnergyEvaluator::new(EvaluatorConfig::default(), None);
    let small = SamAnalog::derive("SAM", AlkylGroup::Methyl, Isostere::Carboxylate, false).to_structure().unwrap();
    let large = SamAnalog::derive("SAM", AlkylGroup::Benzyl, Isostere::Tetrazole, false).to_structure().unwrap();

    let small_result = evaluator.evaluate(&small).await.unwrap();
    let large_result = evaluator.evaluate(&large).await.unwrap();

    assert_eq!(small_result.method, EnergyMethod::Simulated);
    assert_eq!(large_result.method, EnergyMethod::ClassicalFallback);
    assert!((large_result.confidence - 0.85).abs() < 1e-9);
}

fn optimizer(seed: u64) -> Arc<AnalogOptimizer> {
    let evaluator = Arc::new(EnergyEvaluator::new(EvaluatorConfig { seed, ..Default::default() }, Some(Arc::new(InMemoryCache::new()))));
    Arc::new(AnalogOptimizer::new(evaluator, RouteOptimizer::default(), ScreeningThresholds::default()))
}

#[tokio::test]
async fn optimization_is_deterministic_for_a_fixed_seed() {
    let criteria = OptimizationCriteria { stability_min: 3000.0, turnover_min: 50.0, selectivity_target: 0.8 };
    let context = TargetContext { methyltransferase: "DNMT1".to_string() };

    let first = optimizer(42).optimize_analog(&analog(), &context, &criteria).await.unwrap();
    let second = optimizer(42).optimize_analog(&analog(), &context, &criteria).await.unwrap();

    assert_eq!(first.best.id, second.best.id);
    assert_eq!(first.confidence, second.confidence);
    assert_eq!(first.predicted_properties.ground_state_energy, second.predicted_properties.ground_state_energy);
}

#[tokio::test]
async fn winner_carries_an_executable_synthesis_plan() {
    let criteria = OptimizationCriteria { stability_min: 3000.0, turnover_min: 50.0, selectivity_target: 0.8 };
    let context = TargetContext { methyltransferase: "DNMT1".to_string() };
    let result = optimizer(1).optimize_analog(&analog(), &context, &criteria).await.unwrap();

    assert_eq!(result.best.carboxyl_isostere, Isostere::Tetrazole);
    let plan = &result.synthesis_plan;
    assert!(!plan.steps().is_empty());
    assert!(plan.overall_yield() > 0.0 && plan.overall_yield() <= 100.0);
}

#[tokio::test]
async fn workflow_failure_preserves_completed_prefix() {
    let orchestrator = Orchestrator::new(optimizer(3), Arc::new(InMemoryWorkflowStore::default()));
    let spec = WorkflowSpec { methyltransferase: "hMAT2A".to_string(),
                              base: analog(),
                              stages: vec!["screening".to_string(), "no-such-stage".to_string(), "property-prediction".to_string()],
                              criteria: OptimizationCriteria { stability_min: 3000.0, turnover_min: 50.0, selectivity_target: 0.8 } };

    let workflow = orchestrator.run(spec).await.unwrap();

    assert_eq!(workflow.status, WorkflowStatus::Failed);
    assert_eq!(workflow.stages[0].status(), StageStatus::Completed);
    assert_eq!(workflow.stages[1].status(), StageStatus::Failed);
    assert_eq!(workflow.stages[2].status(), StageStatus::Pending);

    // El snapshot persistido coincide con lo devuelto.
    let persisted = orchestrator.store().load(workflow.id).await.unwrap();
    assert_eq!(persisted.status, WorkflowStatus::Failed);
    assert_eq!(persisted.stages[2].status(), StageStatus::Pending);
}

#[tokio::test]
async fn full_workflow_reports_bounded_top_candidates() {
    let orchestrator = Orchestrator::new(optimizer(5), Arc::new(InMemoryWorkflowStore::default()));
    let spec = WorkflowSpec { methyltransferase: "hMAT2A".to_string(),
                              base: analog(),
                              stages: vec!["screening".to_string(), "optimization".to_string(), "property-prediction".to_string()],
                              criteria: OptimizationCriteria { stability_min: 3000.0, turnover_min: 50.0, selectivity_target: 0.8 } };

    let workflow = orchestrator.run(spec).await.unwrap();
    assert_eq!(workflow.status, WorkflowStatus::Completed);
    let results = workflow.results.unwrap();
    assert!(results.top_candidates.len() <= 5);
    assert_eq!(results.screened_count, 18);
    assert!(results.recommendations.iter().any(|r| r.contains("wet-lab")));
}
