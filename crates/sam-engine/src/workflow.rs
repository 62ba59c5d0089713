//! Orquestador del workflow de descubrimiento.
//!
//! Un workflow es una secuencia estricta de etapas nombradas. Las etapas se
//! ejecutan en orden y una falla corta la secuencia: las etapas posteriores
//! quedan pendientes y el workflow completo se marca como fallido, pero
//! `run` devuelve igualmente el estado final para inspección. Dentro de una
//! etapa las evaluaciones independientes se despachan concurrentemente.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use sam_domain::SamAnalog;

use crate::candidates::{AnalogOptimizer, OptimizationCriteria, PredictedProperties, Recommendation, ScreenedCandidate, TargetContext};
use crate::errors::EngineError;

/// Estado de una etapa. Las transiciones son estrictamente hacia adelante:
/// pending -> running -> completed | failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Running,
    Completed,
    Failed,
}

/// Una etapa del workflow con su estado y salida serializada.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStage {
    pub name: String,
    status: StageStatus,
    /// Avance porcentual de la etapa: 0 hasta completarse, 100 al completar.
    pub progress: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub output: Option<serde_json::Value>,
    pub error: Option<String>,
}

impl WorkflowStage {
    fn new(name: &str) -> Self {
        WorkflowStage { name: name.to_string(),
                        status: StageStatus::Pending,
                        progress: 0.0,
                        started_at: None,
                        completed_at: None,
                        output: None,
                        error: None }
    }

    pub fn status(&self) -> StageStatus {
        self.status
    }

    fn begin(&mut self) -> Result<(), EngineError> {
        if self.status != StageStatus::Pending {
            return Err(EngineError::Internal(format!("stage {} cannot start from {:?}", self.name, self.status)));
        }
        self.status = StageStatus::Running;
        self.started_at = Some(Utc::now());
        Ok(())
    }

    fn complete(&mut self, output: serde_json::Value) {
        self.status = StageStatus::Completed;
        self.progress = 100.0;
        self.completed_at = Some(Utc::now());
        self.output = Some(output);
    }

    fn fail(&mut self, error: String) {
        self.status = StageStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error = Some(error);
    }
}

/// Resumen final de un workflow completado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResults {
    /// Identificadores de los mejores candidatos, a lo sumo cinco.
    pub top_candidates: Vec<String>,
    pub screened_count: usize,
    pub optimized_count: usize,
    pub total_compute_time_ms: i64,
    pub confidence: f64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub methyltransferase: String,
    pub base: SamAnalog,
    pub stages: Vec<WorkflowStage>,
    pub status: WorkflowStatus,
    pub created_at: DateTime<Utc>,
    pub results: Option<WorkflowResults>,
}

/// Especificación de entrada de un workflow.
#[derive(Debug, Clone)]
pub struct WorkflowSpec {
    pub methyltransferase: String,
    pub base: SamAnalog,
    pub stages: Vec<String>,
    pub criteria: OptimizationCriteria,
}

/// Persistencia de snapshots de workflow. Cada transición de estado
/// sobrescribe el snapshot completo bajo el id del workflow.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn save(&self, workflow: &Workflow);
    async fn load(&self, id: Uuid) -> Option<Workflow>;
}

pub struct InMemoryWorkflowStore {
    inner: DashMap<Uuid, Workflow>,
}

impl Default for InMemoryWorkflowStore {
    fn default() -> Self {
        InMemoryWorkflowStore { inner: DashMap::new() }
    }
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn save(&self, workflow: &Workflow) {
        self.inner.insert(workflow.id, workflow.clone());
    }

    async fn load(&self, id: Uuid) -> Option<Workflow> {
        self.inner.get(&id).map(|entry| entry.value().clone())
    }
}

/// Datos que fluyen entre etapas dentro de una misma corrida.
#[derive(Default)]
struct StageContext {
    screened: Vec<ScreenedCandidate>,
    winner: Option<SamAnalog>,
    winner_confidence: f64,
    predictions: Vec<(String, PredictedProperties)>,
}

pub struct Orchestrator {
    optimizer: Arc<AnalogOptimizer>,
    store: Arc<dyn WorkflowStore>,
}

impl Orchestrator {
    pub fn new(optimizer: Arc<AnalogOptimizer>, store: Arc<dyn WorkflowStore>) -> Self {
        Orchestrator { optimizer, store }
    }

    pub fn store(&self) -> &Arc<dyn WorkflowStore> {
        &self.store
    }

    /// Ejecuta un workflow completo. Las etapas corren en el orden dado; la
    /// primera falla detiene la secuencia. Devuelve el workflow final tanto
    /// en éxito como en falla de etapa; solo los errores de contrato de la
    /// especificación (por ejemplo, sin etapas) devuelven `Err`.
    pub async fn run(&self, spec: WorkflowSpec) -> Result<Workflow, EngineError> {
        if spec.stages.is_empty() {
            return Err(EngineError::InvalidInput("workflow requires at least one stage".into()));
        }

        let mut workflow = Workflow { id: Uuid::new_v4(),
                                      methyltransferase: spec.methyltransferase.clone(),
                                      base: spec.base.clone(),
                                      stages: spec.stages.iter().map(|s| WorkflowStage::new(s)).collect(),
                                      status: WorkflowStatus::Running,
                                      created_at: Utc::now(),
                                      results: None };
        self.store.save(&workflow).await;
        info!("workflow {} started with {} stages", workflow.id, workflow.stages.len());

        let context = TargetContext { methyltransferase: spec.methyltransferase.clone() };
        let mut stage_data = StageContext::default();

        for idx in 0..workflow.stages.len() {
            workflow.stages[idx].begin()?;
            self.store.save(&workflow).await;

            let stage_name = workflow.stages[idx].name.clone();
            match self.run_stage(&stage_name, &spec, &context, &mut stage_data).await {
                Ok(output) => {
                    workflow.stages[idx].complete(output);
                    self.store.save(&workflow).await;
                }
                Err(err) => {
                    warn!("workflow {} stage {} failed: {}", workflow.id, stage_name, err);
                    workflow.stages[idx].fail(err.to_string());
                    workflow.status = WorkflowStatus::Failed;
                    self.store.save(&workflow).await;
                    return Ok(workflow);
                }
            }
        }

        workflow.results = Some(Self::summarize(&workflow, &stage_data));
        workflow.status = WorkflowStatus::Completed;
        self.store.save(&workflow).await;
        info!("workflow {} completed", workflow.id);
        Ok(workflow)
    }

    async fn run_stage(&self, name: &str, spec: &WorkflowSpec, context: &TargetContext, data: &mut StageContext) -> Result<serde_json::Value, EngineError> {
        match name {
            "screening" => {
                let candidates = AnalogOptimizer::generate_candidates(&spec.base);
                data.screened = self.optimizer.screen_candidates(context, &candidates)?;
                let proceed = data.screened
                                  .iter()
                                  .filter(|s| s.recommendation == Recommendation::Proceed)
                                  .count();
                Ok(serde_json::json!({
                    "screened": data.screened.len(),
                    "proceed": proceed,
                }))
            }
            "optimization" => {
                let result = self.optimizer.optimize_analog(&spec.base, context, &spec.criteria).await?;
                let output = serde_json::json!({
                    "best": result.best.id,
                    "confidence": result.confidence,
                    "route": result.synthesis_plan.name,
                });
                data.winner = Some(result.best);
                data.winner_confidence = result.confidence;
                Ok(output)
            }
            "property-prediction" => {
                // Predice sobre el ganador si la optimización ya corrió, o
                // sobre los candidatos que pasaron el cribado en su defecto.
                let targets: Vec<SamAnalog> = match &data.winner {
                    Some(winner) => vec![winner.clone()],
                    None => data.screened
                               .iter()
                               .filter(|s| s.recommendation == Recommendation::Proceed)
                               .map(|s| s.analog.clone())
                               .collect(),
                };
                if targets.is_empty() {
                    return Err(EngineError::InvalidInput("property prediction has no candidates; run screening or optimization first".into()));
                }
                let evaluations = join_all(targets.iter().map(|t| self.predict(t))).await;
                data.predictions.clear();
                for (target, evaluation) in targets.iter().zip(evaluations) {
                    data.predictions.push((target.id.clone(), evaluation?));
                }
                Ok(serde_json::json!({
                    "predicted": data.predictions.len(),
                }))
            }
            other => Err(EngineError::InvalidInput(format!("unknown workflow stage: {}", other))),
        }
    }

    async fn predict(&self, analog: &SamAnalog) -> Result<PredictedProperties, EngineError> {
        let structure = analog.to_structure()?;
        let energy = self.optimizer.evaluator().evaluate(&structure).await?;
        Ok(PredictedProperties::from_energy(&energy))
    }

    fn summarize(workflow: &Workflow, data: &StageContext) -> WorkflowResults {
        let mut top: Vec<String> = Vec::new();
        if let Some(winner) = &data.winner {
            top.push(winner.id.clone());
        }
        for screened in &data.screened {
            if top.len() >= 5 {
                break;
            }
            if !top.contains(&screened.analog.id) {
                top.push(screened.analog.id.clone());
            }
        }
        let elapsed = workflow.stages
                              .iter()
                              .filter_map(|s| Some((s.completed_at? - s.started_at?).num_milliseconds()))
                              .sum();
        WorkflowResults { top_candidates: top,
                          screened_count: data.screened.len(),
                          optimized_count: if data.winner.is_some() { 1 } else { 0 },
                          total_compute_time_ms: elapsed,
                          confidence: 0.85,
                          recommendations: vec!["Proceed to wet-lab validation of top candidates".to_string(),
                                                "Verify enzymatic turnover against the target methyltransferase".to_string(),
                                                "Confirm stability predictions under assay buffer conditions".to_string()] }
    }
}
