//! Evaluador de energía molecular.
//!
//! Contrato: `evaluate(structure) -> EnergyResult` con computación a lo sumo
//! una vez por identidad de estructura por época de cache. El evaluador
//! decide entre el camino simulado y el fallback clásico con una regla de
//! admisibilidad fija, y escribe el resultado en cache con TTL fijo sea cual
//! sea el camino.
//!
//! La cache es opcional por diseño: sin configurarla el evaluador computa
//! siempre, jamás falla por su ausencia.

pub mod estimator;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use sam_domain::MolecularStructure;

use crate::cache::CacheStore;
use crate::errors::EngineError;
pub use estimator::{ClassicalFallbackEstimator, EnergyEstimator, EnergyMethod, Estimate, ResourceUsage, SimulatedQuantumEstimator};

/// Resultado de una evaluación de energía. Se cachea serializado en JSON
/// bajo la clave `(structure.id, canonical_hash)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyResult {
    pub simulation_id: String,
    pub method: EnergyMethod,
    pub energy: f64,
    pub convergence: bool,
    pub iterations: u32,
    pub confidence: f64,
    pub resources: ResourceUsage,
}

/// Configuración explícita del evaluador; se construye una vez y se pasa por
/// referencia (sin estado global).
#[derive(Debug, Clone)]
pub struct EvaluatorConfig {
    /// Qubits máximos del backend simulado.
    pub max_qubits: u32,
    /// Presupuesto de iteraciones del lazo variacional.
    pub max_iterations: u32,
    pub error_mitigation: bool,
    /// TTL de los resultados cacheados.
    pub cache_ttl: Duration,
    /// Semilla de la fuente aleatoria del estimador simulado.
    pub seed: u64,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        EvaluatorConfig { max_qubits: 32,
                          max_iterations: 100,
                          error_mitigation: true,
                          cache_ttl: Duration::from_secs(86_400),
                          seed: 0 }
    }
}

/// Límite de átomos para el camino simulado.
const SIMULATED_ATOM_LIMIT: usize = 20;

pub struct EnergyEvaluator {
    config: EvaluatorConfig,
    cache: Option<Arc<dyn CacheStore>>,
    simulated: Box<dyn EnergyEstimator>,
    classical: Box<dyn EnergyEstimator>,
}

impl EnergyEvaluator {
    /// Crea el evaluador con las dos estrategias concretas. `cache: None`
    /// degrada a computar siempre.
    pub fn new(config: EvaluatorConfig, cache: Option<Arc<dyn CacheStore>>) -> Self {
        let simulated = Box::new(SimulatedQuantumEstimator::new(config.max_qubits, config.max_iterations, config.error_mitigation, config.seed));
        EnergyEvaluator { config,
                          cache,
                          simulated,
                          classical: Box::new(ClassicalFallbackEstimator) }
    }

    /// Variante con estrategias inyectadas (tests y fakes).
    pub fn with_estimators(config: EvaluatorConfig,
                           cache: Option<Arc<dyn CacheStore>>,
                           simulated: Box<dyn EnergyEstimator>,
                           classical: Box<dyn EnergyEstimator>)
                           -> Self {
        EnergyEvaluator { config, cache, simulated, classical }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    fn cache_key(structure: &MolecularStructure) -> String {
        format!("quantum_energy:{}:{}", structure.id(), structure.canonical_hash())
    }

    /// Regla de admisibilidad del camino simulado: el recuento de electrones
    /// no supera `2 * max_qubits` y la estructura tiene a lo sumo 20 átomos.
    pub fn simulation_admissible(&self, structure: &MolecularStructure) -> bool {
        structure.electron_count() <= 2 * self.config.max_qubits as i64 && structure.atom_count() <= SIMULATED_ATOM_LIMIT
    }

    /// Evalúa la energía de la estructura, con cache-first y computación a
    /// lo sumo una vez por identidad dentro de la ventana de TTL.
    pub async fn evaluate(&self, structure: &MolecularStructure) -> Result<EnergyResult, EngineError> {
        if structure.atoms().is_empty() {
            return Err(EngineError::InvalidInput(format!("structure '{}' has no atoms", structure.id())));
        }

        let key = Self::cache_key(structure);
        if let Some(cache) = &self.cache {
            if let Some(raw) = cache.get(&key).await {
                match serde_json::from_str::<EnergyResult>(&raw) {
                    Ok(hit) => {
                        debug!("energy cache hit for {}", structure.id());
                        return Ok(hit);
                    }
                    // Una entrada corrupta no es fatal: se recomputa.
                    Err(e) => warn!("discarding corrupt cache entry for {}: {}", key, e),
                }
            }
        }

        let estimator = if self.simulation_admissible(structure) { &self.simulated } else { &self.classical };
        let estimate = estimator.estimate(structure);
        let result = EnergyResult { simulation_id: format!("sim_{}", Uuid::new_v4()),
                                    method: estimator.method(),
                                    energy: estimate.energy,
                                    convergence: estimate.converged,
                                    iterations: estimate.iterations,
                                    confidence: estimate.confidence,
                                    resources: estimate.resources };

        if let Some(cache) = &self.cache {
            match serde_json::to_string(&result) {
                Ok(json) => cache.set_with_expiry(&key, self.config.cache_ttl, json).await,
                Err(e) => warn!("could not serialize energy result for cache: {}", e),
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::InMemoryCache;
    use sam_domain::Atom;

    fn chain(id: &str, element: &str, count: usize) -> MolecularStructure {
        let atoms = (0..count).map(|i| Atom::new(element, i as f64, 0.0, 0.0)).collect();
        MolecularStructure::new(id, id, atoms, vec![], 0, 1).unwrap()
    }

    #[test]
    fn admissibility_boundary_is_exact() {
        let config = EvaluatorConfig { max_qubits: 2, ..Default::default() };
        let evaluator = EnergyEvaluator::new(config, None);
        // 4 H -> 4 electrones == 2 * max_qubits: admisible.
        assert!(evaluator.simulation_admissible(&chain("ok", "H", 4)));
        // 5 H -> 5 electrones == 2 * max_qubits + 1: nunca simulado.
        assert!(!evaluator.simulation_admissible(&chain("no", "H", 5)));
    }

    #[test]
    fn atom_limit_forces_classical() {
        let config = EvaluatorConfig { max_qubits: 64, ..Default::default() };
        let evaluator = EnergyEvaluator::new(config, None);
        assert!(!evaluator.simulation_admissible(&chain("big", "H", 21)));
    }

    #[tokio::test]
    async fn works_without_cache() {
        let evaluator = EnergyEvaluator::new(EvaluatorConfig::default(), None);
        let result = evaluator.evaluate(&chain("nc", "H", 4)).await.unwrap();
        assert_eq!(result.method, EnergyMethod::Simulated);
    }

    #[tokio::test]
    async fn empty_structure_is_rejected() {
        let evaluator = EnergyEvaluator::new(EvaluatorConfig::default(), None);
        let s = MolecularStructure::new("empty", "empty", vec![], vec![], 0, 1).unwrap();
        assert!(matches!(evaluator.evaluate(&s).await, Err(EngineError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn cached_result_is_bit_identical() {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());
        let evaluator = EnergyEvaluator::new(EvaluatorConfig::default(), Some(cache));
        let s = chain("h4", "H", 4);
        let first = evaluator.evaluate(&s).await.unwrap();
        let second = evaluator.evaluate(&s).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.simulation_id, second.simulation_id);
    }
}
