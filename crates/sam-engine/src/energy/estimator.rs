//! Estrategias de estimación de energía.
//!
//! Dos implementaciones concretas del trait `EnergyEstimator`:
//! - `SimulatedQuantumEstimator`: circuito parametrizado de profundidad fija
//!   y búsqueda local estocástica con amplitud decreciente. La fuente
//!   aleatoria es sembrable y se deriva por estructura, de modo que el mismo
//!   par (seed, estructura) produce siempre el mismo resultado.
//! - `ClassicalFallbackEstimator`: forma cerrada por átomo y por enlace,
//!   converge en una iteración con confianza fija.
//!
//! La "energía" es una señal de ordenamiento, no un valor físico.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use sam_domain::molecule::atomic_number;
use sam_domain::MolecularStructure;

/// Método con el que se produjo un resultado de energía.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyMethod {
    Simulated,
    ClassicalFallback,
}

/// Recursos consumidos por la estimación.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub qubits: u32,
    pub gate_depth: u32,
    pub shot_count: u32,
    /// Tiempo de coherencia en microsegundos.
    pub coherence_time_us: f64,
    pub error_rate: f64,
}

impl ResourceUsage {
    pub fn none() -> Self {
        ResourceUsage { qubits: 0, gate_depth: 0, shot_count: 0, coherence_time_us: 0.0, error_rate: 0.0 }
    }
}

/// Salida cruda de una estrategia, antes de envolverla en `EnergyResult`.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub energy: f64,
    pub converged: bool,
    pub iterations: u32,
    pub confidence: f64,
    pub resources: ResourceUsage,
}

/// Estrategia de estimación de energía para una estructura molecular.
pub trait EnergyEstimator: Send + Sync {
    fn method(&self) -> EnergyMethod;
    fn estimate(&self, structure: &MolecularStructure) -> Estimate;
}

/// Tolerancia de convergencia entre iteraciones sucesivas.
const CONVERGENCE_TOL: f64 = 1e-6;
/// Factor de corrección determinista por mitigación de errores.
const ERROR_MITIGATION_DAMPING: f64 = 0.98;

const SIMULATED_SHOT_COUNT: u32 = 8192;
const ROTATION_LAYERS: u32 = 3;

pub struct SimulatedQuantumEstimator {
    max_qubits: u32,
    max_iterations: u32,
    error_mitigation: bool,
    seed: u64,
}

impl SimulatedQuantumEstimator {
    pub fn new(max_qubits: u32, max_iterations: u32, error_mitigation: bool, seed: u64) -> Self {
        SimulatedQuantumEstimator { max_qubits, max_iterations, error_mitigation, seed }
    }

    /// RNG determinista por estructura: la semilla global se mezcla con el
    /// prefijo del hash canónico para que estructuras distintas no compartan
    /// secuencia y la misma estructura siempre repita la suya.
    fn rng_for(&self, structure: &MolecularStructure) -> StdRng {
        let mut mix: u64 = self.seed;
        for (i, b) in structure.canonical_hash().bytes().take(8).enumerate() {
            mix ^= (b as u64) << (8 * i);
        }
        StdRng::seed_from_u64(mix)
    }

    /// Hamiltoniano simplificado: diagonal proporcional al número atómico,
    /// fuera de diagonal 1/r entre pares.
    fn hamiltonian_sum(structure: &MolecularStructure) -> f64 {
        let atoms = structure.atoms();
        let n = atoms.len();
        let mut sum = 0.0;
        for i in 0..n {
            for j in 0..n {
                if i == j {
                    sum += -13.6 * atomic_number(&atoms[i].element) as f64;
                } else {
                    let dist = atoms[i].distance(&atoms[j]).max(1e-3);
                    sum += -1.0 / dist;
                }
            }
        }
        sum
    }

    /// Número de compuertas del ansatz: capa H inicial más `ROTATION_LAYERS`
    /// capas de rotaciones RY/RZ con escalera de CNOT.
    fn gate_count(qubits: u32) -> u32 {
        qubits + ROTATION_LAYERS * (2 * qubits + qubits.saturating_sub(1))
    }
}

impl EnergyEstimator for SimulatedQuantumEstimator {
    fn method(&self) -> EnergyMethod {
        EnergyMethod::Simulated
    }

    fn estimate(&self, structure: &MolecularStructure) -> Estimate {
        let mut rng = self.rng_for(structure);
        let electrons = structure.electron_count().max(1) as u32;
        let qubits = electrons.min(self.max_qubits).max(1);
        let gate_count = Self::gate_count(qubits);

        let base = Self::hamiltonian_sum(structure) / structure.atom_count().max(1) as f64;
        let mut parameters: Vec<f64> = (0..gate_count).map(|_| rng.gen::<f64>() * 2.0 * std::f64::consts::PI).collect();

        // Búsqueda local estocástica: la amplitud de perturbación decae por
        // iteración, así el cambio entre energías sucesivas termina por caer
        // bajo la tolerancia si el presupuesto de iteraciones alcanza.
        let mut energy = 0.0;
        let mut converged = false;
        let mut iterations = 0;
        let mut amplitude = 0.1;
        for iter in 0..self.max_iterations {
            iterations = iter + 1;
            let jitter: f64 = rng.gen_range(-0.5..0.5);
            let new_energy = base * (1.0 + amplitude * jitter);
            if iter > 0 && (new_energy - energy).abs() < CONVERGENCE_TOL {
                energy = new_energy;
                converged = true;
                break;
            }
            energy = new_energy;
            // Empuje de parámetros hacia menor energía.
            for p in parameters.iter_mut() {
                *p += amplitude * rng.gen_range(-0.5..0.5);
            }
            amplitude *= 0.8;
        }

        if self.error_mitigation {
            energy *= ERROR_MITIGATION_DAMPING;
        }

        Estimate { energy,
                   converged,
                   iterations,
                   confidence: if converged { 0.95 } else { 0.7 },
                   resources: ResourceUsage { qubits,
                                              gate_depth: gate_count / qubits.max(1),
                                              shot_count: SIMULATED_SHOT_COUNT,
                                              coherence_time_us: 100.0,
                                              error_rate: 0.001 } }
    }
}

/// Aproximación clásica cerrada, usada cuando el sistema excede la
/// admisibilidad del camino simulado.
pub struct ClassicalFallbackEstimator;

impl EnergyEstimator for ClassicalFallbackEstimator {
    fn method(&self) -> EnergyMethod {
        EnergyMethod::ClassicalFallback
    }

    fn estimate(&self, structure: &MolecularStructure) -> Estimate {
        let mut energy = 0.0;
        for atom in structure.atoms() {
            energy -= 13.6 * (atomic_number(&atom.element) as f64).powf(2.4);
        }
        for bond in structure.bonds() {
            energy -= 3.5 * bond.order;
        }
        Estimate { energy,
                   converged: true,
                   iterations: 1,
                   confidence: 0.85,
                   resources: ResourceUsage::none() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sam_domain::{Atom, Bond};

    fn h2() -> MolecularStructure {
        MolecularStructure::new("h2",
                                "hydrogen",
                                vec![Atom::new("H", 0.0, 0.0, 0.0), Atom::new("H", 0.74, 0.0, 0.0)],
                                vec![Bond { atom1: 0, atom2: 1, order: 1.0 }],
                                0,
                                1).unwrap()
    }

    #[test]
    fn simulated_estimate_is_deterministic_per_seed() {
        let est = SimulatedQuantumEstimator::new(8, 100, true, 42);
        let a = est.estimate(&h2());
        let b = est.estimate(&h2());
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = SimulatedQuantumEstimator::new(8, 100, true, 1).estimate(&h2());
        let b = SimulatedQuantumEstimator::new(8, 100, true, 2).estimate(&h2());
        assert_ne!(a.energy, b.energy);
    }

    #[test]
    fn exhausted_iterations_lower_confidence() {
        let est = SimulatedQuantumEstimator::new(8, 5, false, 7);
        let e = est.estimate(&h2());
        assert!(!e.converged);
        assert_eq!(e.iterations, 5);
        assert_eq!(e.confidence, 0.7);
    }

    #[test]
    fn generous_budget_converges() {
        let est = SimulatedQuantumEstimator::new(8, 200, false, 7);
        let e = est.estimate(&h2());
        assert!(e.converged, "decaying amplitude must cross the tolerance");
        assert_eq!(e.confidence, 0.95);
    }

    #[test]
    fn mitigation_damps_final_energy() {
        let plain = SimulatedQuantumEstimator::new(8, 50, false, 9).estimate(&h2());
        let mitigated = SimulatedQuantumEstimator::new(8, 50, true, 9).estimate(&h2());
        assert!((mitigated.energy - plain.energy * 0.98).abs() < 1e-9);
    }

    #[test]
    fn classical_fallback_is_single_shot() {
        let e = ClassicalFallbackEstimator.estimate(&h2());
        assert!(e.converged);
        assert_eq!(e.iterations, 1);
        assert_eq!(e.confidence, 0.85);
        // Dos H más un enlace sencillo.
        let expected = -13.6 * 2.0 - 3.5;
        assert!((e.energy - expected).abs() < 1e-9);
        assert_eq!(e.resources, ResourceUsage::none());
    }
}
