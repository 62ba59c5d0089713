//! Capa de aplicación: configuración y armado del motor.
//!
//! El armado es explícito: cada componente recibe su configuración por
//! constructor y la composición vive en `build_orchestrator`, de modo que
//! los tests puedan armar variantes con fakes sin tocar el entorno.

pub mod config;

use std::sync::Arc;

use sam_engine::cache::InMemoryCache;
use sam_engine::{AnalogOptimizer, EnergyEvaluator, InMemoryWorkflowStore, Orchestrator, RouteOptimizer};

use config::AppConfig;

/// Arma un orquestador completo a partir de la configuración dada, con
/// almacenamiento en memoria para cache y snapshots de workflow. Falla solo
/// ante una configuración incoherente (umbrales de cribado invertidos).
pub fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator, sam_engine::EngineError> {
    let thresholds = config.screening.thresholds();
    thresholds.validate()?;
    let cache = if config.engine.cache_enabled {
        Some(Arc::new(InMemoryCache::new()) as Arc<dyn sam_engine::CacheStore>)
    } else {
        None
    };
    let evaluator = Arc::new(EnergyEvaluator::new(config.engine.evaluator_config(), cache));
    let optimizer = Arc::new(AnalogOptimizer::new(evaluator, RouteOptimizer::default(), thresholds));
    Ok(Orchestrator::new(optimizer, Arc::new(InMemoryWorkflowStore::default())))
}
