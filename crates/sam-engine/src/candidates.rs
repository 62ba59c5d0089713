//! Generación, puntuación y cribado de candidatos.
//!
//! El optimizador enumera el producto cruzado de los ejes de modificación
//! (grupos alquilo × isósteros), evalúa cada candidato con el evaluador de
//! energía y los puntúa contra criterios de aceptación del llamador. La
//! selección es el máximo estricto; los empates los resuelve el orden de
//! generación (gana el primero), de modo que el resultado es determinista.

use futures::future::join_all;
use log::info;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use sam_domain::{AlkylGroup, AlkylSize, Isostere, MolecularStructure, SamAnalog, SynthesisRoute};

use crate::energy::{EnergyEvaluator, EnergyResult};
use crate::errors::EngineError;
use crate::routes::RouteOptimizer;

/// Contexto del objetivo: la metiltransferasa contra la que se optimiza.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetContext {
    pub methyltransferase: String,
}

/// Criterios de aceptación provistos por el llamador.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationCriteria {
    /// Vida media mínima aceptable, en minutos.
    pub stability_min: f64,
    /// Eficiencia de recambio mínima (% vs sustrato nativo).
    pub turnover_min: f64,
    pub selectivity_target: f64,
}

/// Propiedades predichas de un candidato, combinando la energía evaluada con
/// derivaciones fijas (HOMO/LUMO desplazados respecto del estado base).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedProperties {
    pub ground_state_energy: f64,
    pub homo_energy: f64,
    pub lumo_energy: f64,
    pub dipole: [f64; 3],
    pub polarizability: f64,
}

impl PredictedProperties {
    pub fn from_energy(result: &EnergyResult) -> Self {
        PredictedProperties { ground_state_energy: result.energy,
                              homo_energy: result.energy + 5.0,
                              lumo_energy: result.energy + 8.0,
                              dipole: [1.2, 0.5, 0.3],
                              polarizability: 15.5 }
    }
}

/// Resultado de `optimize_analog`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best: SamAnalog,
    pub predicted_properties: PredictedProperties,
    pub synthesis_plan: SynthesisRoute,
    /// Puntaje del ganador; los pesos de la fórmula suman 1.0 al máximo.
    pub confidence: f64,
}

/// Umbrales del cribado, configurables por política.
#[derive(Debug, Clone)]
pub struct ScreeningThresholds {
    pub proceed_above: f64,
    pub optimize_above: f64,
}

impl Default for ScreeningThresholds {
    fn default() -> Self {
        ScreeningThresholds { proceed_above: 50.0, optimize_above: 10.0 }
    }
}

impl ScreeningThresholds {
    /// Los umbrales deben estar ordenados para que los tres buckets sean
    /// alcanzables.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.proceed_above <= self.optimize_above {
            return Err(EngineError::Configuration(format!("proceed threshold ({}) must exceed optimize threshold ({})",
                                                          self.proceed_above, self.optimize_above)));
        }
        Ok(())
    }

    /// Recomendación de tres vías por actividad relativa.
    pub fn recommend(&self, relative_activity: f64) -> Recommendation {
        if relative_activity > self.proceed_above {
            Recommendation::Proceed
        } else if relative_activity > self.optimize_above {
            Recommendation::Optimize
        } else {
            Recommendation::Reject
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Proceed,
    Optimize,
    Reject,
}

/// Perfil de compatibilidad enzimática derivado de la actividad relativa,
/// con cinética base de hMAT2A de literatura.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatCompatibility {
    pub enzyme: String,
    pub km: f64,
    pub vmax: f64,
    pub kcat: f64,
    pub specificity: f64,
    /// Actividad relativa en porcentaje vs metionina nativa.
    pub relative_activity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenedCandidate {
    pub analog: SamAnalog,
    pub compatibility: MatCompatibility,
    pub recommendation: Recommendation,
}

/// Opciones para la generación combinatoria de bibliotecas de análogos.
#[derive(Debug, Clone)]
pub struct LibraryOptions {
    pub isosteres: Vec<Isostere>,
    pub alkyl_groups: Vec<AlkylGroup>,
    pub include_selenium: bool,
    pub max_size: usize,
}

/// Ranking de sustratos para una enzima, ordenado por puntaje combinado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubstrateRanking {
    pub rankings: Vec<RankedSubstrate>,
    pub mechanistic_insights: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSubstrate {
    pub substrate_id: String,
    /// Más positivo es mejor (energía de unión negada).
    pub binding_score: f64,
    pub reaction_rate: f64,
    pub selectivity: f64,
}

pub struct AnalogOptimizer {
    evaluator: Arc<EnergyEvaluator>,
    routes: RouteOptimizer,
    thresholds: ScreeningThresholds,
}

impl AnalogOptimizer {
    pub fn new(evaluator: Arc<EnergyEvaluator>, routes: RouteOptimizer, thresholds: ScreeningThresholds) -> Self {
        AnalogOptimizer { evaluator, routes, thresholds }
    }

    pub fn thresholds(&self) -> &ScreeningThresholds {
        &self.thresholds
    }

    pub fn evaluator(&self) -> &Arc<EnergyEvaluator> {
        &self.evaluator
    }

    /// Producto cruzado completo de los ejes de modificación fijos. Cada
    /// candidato hereda el resto de los campos del análogo base.
    pub fn generate_candidates(base: &SamAnalog) -> Vec<SamAnalog> {
        let mut candidates = Vec::with_capacity(AlkylGroup::ALL.len() * Isostere::CANDIDATE_SET.len());
        for alkyl in AlkylGroup::ALL {
            for isostere in Isostere::CANDIDATE_SET {
                candidates.push(SamAnalog::derive(&base.base_id, alkyl, isostere, base.selenium_substituted));
            }
        }
        candidates
    }

    /// Puntúa un candidato contra los criterios. Los pesos máximos suman
    /// 1.0: estabilidad 0.4, resistencia a degradación 0.3, bono de energía
    /// favorable 0.3.
    pub fn score_candidate(candidate: &SamAnalog, properties: &PredictedProperties, criteria: &OptimizationCriteria) -> f64 {
        let mut score = 0.0;
        if candidate.half_life_min >= criteria.stability_min {
            score += 0.4;
        } else {
            score += (candidate.half_life_min / criteria.stability_min) * 0.4;
        }
        score += (candidate.degradation_resistance / 10.0).min(0.3);
        if properties.ground_state_energy < -100.0 {
            score += 0.3;
        }
        score
    }

    /// Optimiza un análogo base contra el contexto y los criterios dados:
    /// genera candidatos, los evalúa concurrentemente, elige el máximo
    /// estricto y deriva el plan de síntesis del ganador.
    pub async fn optimize_analog(&self, base: &SamAnalog, context: &TargetContext, criteria: &OptimizationCriteria) -> Result<OptimizationResult, EngineError> {
        let candidates = Self::generate_candidates(base);
        if candidates.is_empty() {
            return Err(EngineError::InvalidInput("empty candidate batch".into()));
        }
        info!("optimizing {} candidates for {} against {}", candidates.len(), base.base_id, context.methyltransferase);

        // Fan-out: cada candidato se evalúa de forma independiente; el único
        // recurso compartido es la cache, que es por clave.
        let evaluations = join_all(candidates.iter().map(|c| self.evaluate_candidate(c))).await;

        let mut best: Option<(usize, f64, PredictedProperties)> = None;
        for (idx, evaluation) in evaluations.into_iter().enumerate() {
            let properties = evaluation?;
            let score = Self::score_candidate(&candidates[idx], &properties, criteria);
            // Máximo estricto: a igual puntaje se conserva el primero.
            let improves = match &best {
                Some((_, best_score, _)) => score > *best_score,
                None => true,
            };
            if improves {
                best = Some((idx, score, properties));
            }
        }
        // La lista nunca está vacía a esta altura.
        let (idx, confidence, predicted_properties) = best.ok_or_else(|| EngineError::Internal("no candidate survived evaluation".into()))?;
        let winner = candidates[idx].clone();

        let plan = self.routes.optimize_route(&winner, None)?;

        Ok(OptimizationResult { best: winner,
                                predicted_properties,
                                synthesis_plan: plan.optimized_route,
                                confidence })
    }

    async fn evaluate_candidate(&self, candidate: &SamAnalog) -> Result<PredictedProperties, EngineError> {
        let structure = candidate.to_structure()?;
        let energy = self.evaluator.evaluate(&structure).await?;
        Ok(PredictedProperties::from_energy(&energy))
    }

    /// Actividad relativa frente a metionina nativa, en porcentaje. Función
    /// pura de las modificaciones estructurales.
    pub fn relative_activity(analog: &SamAnalog) -> f64 {
        let mut activity = 100.0;
        if analog.carboxyl_isostere == Isostere::Tetrazole {
            activity *= 0.65;
        }
        match analog.alkyl_group.size() {
            AlkylSize::Large => activity *= 0.4,
            AlkylSize::Medium => activity *= 0.7,
            AlkylSize::Small => {}
        }
        activity
    }

    /// Criba un lote de candidatos contra una MAT: ordena descendente por
    /// actividad relativa y recomienda proceder / optimizar / rechazar según
    /// los umbrales configurados.
    pub fn screen_candidates(&self, context: &TargetContext, candidates: &[SamAnalog]) -> Result<Vec<ScreenedCandidate>, EngineError> {
        if candidates.is_empty() {
            return Err(EngineError::InvalidInput("empty candidate batch".into()));
        }
        let mut screened: Vec<ScreenedCandidate> = candidates.iter()
                                                             .map(|analog| {
                                                                 let relative_activity = Self::relative_activity(analog);
                                                                 let compatibility = MatCompatibility { enzyme: context.methyltransferase.clone(),
                                                                                                        km: 396.5,
                                                                                                        vmax: 50.0 * relative_activity / 100.0,
                                                                                                        kcat: 15.0 * relative_activity / 100.0,
                                                                                                        specificity: (15.0 / 400.0) * relative_activity / 100.0,
                                                                                                        relative_activity };
                                                                 let recommendation = self.thresholds.recommend(relative_activity);
                                                                 ScreenedCandidate { analog: analog.clone(), compatibility, recommendation }
                                                             })
                                                             .collect();
        screened.sort_by(|a, b| b.compatibility
                                 .relative_activity
                                 .partial_cmp(&a.compatibility.relative_activity)
                                 .unwrap_or(std::cmp::Ordering::Equal));
        Ok(screened)
    }

    /// Genera una biblioteca combinatoria de análogos para
    /// alquil-randomización, con variantes de selenio opcionales y corte por
    /// tamaño máximo.
    pub fn generate_library(base_id: &str, options: &LibraryOptions) -> Vec<SamAnalog> {
        let mut library = Vec::new();
        'outer: for isostere in &options.isosteres {
            for alkyl in &options.alkyl_groups {
                library.push(SamAnalog::derive(base_id, *alkyl, *isostere, false));
                if library.len() >= options.max_size {
                    break 'outer;
                }
                if options.include_selenium {
                    library.push(SamAnalog::derive(base_id, *alkyl, *isostere, true));
                    if library.len() >= options.max_size {
                        break 'outer;
                    }
                }
            }
        }
        library
    }

    /// Rankea sustratos por afinidad predicha para una enzima dada. La tasa
    /// de reacción sigue una forma de Arrhenius a 37°C con una energía de
    /// activación derivada determinísticamente de la estructura.
    pub async fn rank_substrates(&self, enzyme: &str, substrates: &[MolecularStructure]) -> Result<SubstrateRanking, EngineError> {
        if substrates.is_empty() {
            return Err(EngineError::InvalidInput("empty substrate batch".into()));
        }
        let evaluations = join_all(substrates.iter().map(|s| self.evaluator.evaluate(s))).await;

        let mut rankings = Vec::with_capacity(substrates.len());
        for (substrate, evaluation) in substrates.iter().zip(evaluations) {
            let energy = evaluation?;
            let binding_energy = energy.energy * 0.1;
            let activation_energy = Self::activation_energy(substrate);
            // Arrhenius a 310 K (R en kcal/mol·K).
            let reaction_rate = (-activation_energy / (0.001987 * 310.0)).exp();
            rankings.push(RankedSubstrate { substrate_id: substrate.id().to_string(),
                                            binding_score: -binding_energy,
                                            reaction_rate,
                                            selectivity: reaction_rate / substrates.len() as f64 });
        }
        rankings.sort_by(|a, b| (b.binding_score * b.reaction_rate).partial_cmp(&(a.binding_score * a.reaction_rate))
                                                                   .unwrap_or(std::cmp::Ordering::Equal));

        Ok(SubstrateRanking { rankings,
                              mechanistic_insights: vec![format!("S_N2 mechanism likely for alkyl transfer by {}", enzyme),
                                                         "Transition state stabilization by active site residues".to_string(),
                                                         "Substrate orientation critical for selectivity".to_string(),
                                                         "Consider bioorthogonal handle placement at terminal position".to_string()] })
    }

    /// Energía de activación típica (15-25 kcal/mol) derivada del hash de la
    /// estructura para que el ranking sea reproducible.
    fn activation_energy(substrate: &MolecularStructure) -> f64 {
        let byte = substrate.canonical_hash().bytes().next().unwrap_or(0);
        15.0 + (byte % 100) as f64 / 10.0
    }
}
