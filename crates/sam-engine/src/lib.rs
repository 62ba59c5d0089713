//! Motor de optimización de análogos de SAM.
//!
//! Agrupa los cuatro subsistemas del motor: evaluación de energía molecular
//! (camino simulado con fallback clásico y cache con TTL), generación y
//! cribado de candidatos, optimización de rutas de síntesis, y el
//! orquestador de workflows que los encadena. Todos los componentes se
//! construyen con configuración explícita; no hay estado global.

pub mod cache;
pub mod candidates;
pub mod energy;
pub mod errors;
pub mod routes;
pub mod workflow;

pub use cache::{CacheStore, InMemoryCache};
pub use candidates::{AnalogOptimizer, LibraryOptions, OptimizationCriteria, OptimizationResult, PredictedProperties, Recommendation, ScreenedCandidate, ScreeningThresholds, TargetContext};
pub use energy::{EnergyEvaluator, EnergyMethod, EnergyResult, EvaluatorConfig};
pub use errors::EngineError;
pub use routes::{CostPolicy, RouteConstraints, RouteOptimizer, SynthesisOptimizationResult};
pub use workflow::{InMemoryWorkflowStore, Orchestrator, StageStatus, Workflow, WorkflowSpec, WorkflowStatus, WorkflowStore};
