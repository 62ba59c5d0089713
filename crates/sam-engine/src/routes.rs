//! Optimizador de rutas de síntesis.
//!
//! Genera un catálogo fijo de plantillas de ruta aplicables al análogo
//! objetivo (alquilación directa, alquilación protegida, quimioenzimática y
//! la ruta específica de tetrazol), las puntúa con una fórmula ponderada
//! multi-criterio y devuelve la mejor más hasta tres alternativas con
//! análisis de costo y riesgo. Generación y puntuación son funciones puras
//! del catálogo y el objetivo: sin reintentos ni éxito parcial.

use log::debug;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use sam_domain::{AlkylSize, Isostere, Reagent, RouteStep, SamAnalog, StepConditions, SynthesisRoute};

use crate::errors::EngineError;

/// Restricciones opcionales del llamador sobre el catálogo.
#[derive(Debug, Clone, Default)]
pub struct RouteConstraints {
    pub max_steps: Option<usize>,
    pub max_cost: Option<f64>,
    pub min_yield: Option<f64>,
    pub avoid_reagents: Vec<String>,
}

/// Política de costos: constantes ajustables sin tocar el algoritmo.
#[derive(Debug, Clone)]
pub struct CostPolicy {
    pub hourly_rate: f64,
    pub equipment_per_step: f64,
    pub purification_surcharge: f64,
    /// Rendimiento por debajo del cual un paso paga recargo de purificación.
    pub purification_yield_cutoff: f64,
    pub excellent_below: f64,
    pub good_below: f64,
    pub marginal_below: f64,
}

impl Default for CostPolicy {
    fn default() -> Self {
        CostPolicy { hourly_rate: 50.0,
                     equipment_per_step: 20.0,
                     purification_surcharge: 100.0,
                     purification_yield_cutoff: 90.0,
                     excellent_below: 100.0,
                     good_below: 500.0,
                     marginal_below: 1000.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Excellent,
    Good,
    Marginal,
    Poor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostAnalysis {
    pub reagent_costs: f64,
    pub labor_costs: f64,
    pub equipment_costs: f64,
    pub purification_costs: f64,
    /// Costo normalizado por gramo de producto.
    pub total_per_gram: f64,
    pub economic_viability: CostTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskProbability {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskImpact {
    Severe,
    Moderate,
    Minor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Risk {
    pub description: String,
    pub probability: RiskProbability,
    pub impact: RiskImpact,
    pub mitigation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub technical_risks: Vec<Risk>,
    pub safety_risks: Vec<Risk>,
    pub regulatory_considerations: Vec<String>,
    pub mitigation_strategies: Vec<String>,
}

/// Observación derivada de los pasos afinados con el evaluador mejorado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInsight {
    pub description: String,
    pub confidence: f64,
    pub computational_details: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisOptimizationResult {
    pub optimized_route: SynthesisRoute,
    /// Siguientes mejores rutas en orden descendente de puntaje (hasta 3).
    pub alternatives: Vec<SynthesisRoute>,
    pub insights: Vec<RouteInsight>,
    pub cost_analysis: CostAnalysis,
    pub risk_assessment: RiskAssessment,
    pub scale_up_recommendations: Vec<String>,
}

pub struct RouteOptimizer {
    cost_policy: CostPolicy,
}

impl RouteOptimizer {
    pub fn new(cost_policy: CostPolicy) -> Self {
        RouteOptimizer { cost_policy }
    }

    /// Puntaje ponderado de una ruta. La suma teórica de los términos fijos
    /// es 100; el bono de +2 por paso afinado puede superarla y ese exceso
    /// se conserva a propósito para que el ranking sea reproducible.
    pub fn score_route(route: &SynthesisRoute) -> f64 {
        let mut score = 0.0;
        score += (route.overall_yield() / 100.0) * 40.0;
        score += (1.0 - route.total_time_h / 48.0).max(0.0) * 20.0;
        score += (1.0 - route.total_cost_usd / 1000.0).max(0.0) * 20.0;
        score += route.reproducibility * 10.0;
        score += (route.green_chemistry_score / 100.0) * 10.0;
        score += route.enhanced_step_count() as f64 * 2.0;
        score
    }

    /// Genera, filtra, puntúa y rankea el catálogo para el objetivo.
    pub fn optimize_route(&self, target: &SamAnalog, constraints: Option<&RouteConstraints>) -> Result<SynthesisOptimizationResult, EngineError> {
        let catalog = Self::candidate_routes(target)?;
        let applicable: Vec<SynthesisRoute> = match constraints {
            Some(c) => catalog.into_iter().filter(|r| Self::satisfies(r, c)).collect(),
            None => catalog,
        };
        if applicable.is_empty() {
            return Err(EngineError::InvalidInput(format!("no applicable synthesis route template for '{}'", target.id)));
        }

        let mut scored: Vec<(SynthesisRoute, f64)> = applicable.into_iter()
                                                               .map(|r| {
                                                                   let s = Self::score_route(&r);
                                                                   (r, s)
                                                               })
                                                               .collect();
        // Orden estable descendente: a igual puntaje gana el orden de catálogo.
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        debug!("route ranking for {}: {:?}", target.id, scored.iter().map(|(r, s)| (r.id.clone(), *s)).collect::<Vec<_>>());

        let mut ranked: Vec<SynthesisRoute> = scored.into_iter().map(|(r, _)| r).collect();
        let optimized_route = ranked.remove(0);
        let alternatives: Vec<SynthesisRoute> = ranked.into_iter().take(3).collect();

        let insights = Self::route_insights(&optimized_route);
        let cost_analysis = self.analyze_costs(&optimized_route);
        let risk_assessment = Self::assess_risks(&optimized_route);
        let scale_up_recommendations = Self::scale_up_recommendations(&optimized_route);

        Ok(SynthesisOptimizationResult { optimized_route,
                                         alternatives,
                                         insights,
                                         cost_analysis,
                                         risk_assessment,
                                         scale_up_recommendations })
    }

    fn satisfies(route: &SynthesisRoute, c: &RouteConstraints) -> bool {
        if let Some(max_steps) = c.max_steps {
            if route.steps().len() > max_steps {
                return false;
            }
        }
        if let Some(max_cost) = c.max_cost {
            if route.total_cost_usd > max_cost {
                return false;
            }
        }
        if let Some(min_yield) = c.min_yield {
            if route.overall_yield() < min_yield {
                return false;
            }
        }
        !route.steps().iter().any(|s| s.reagents.iter().any(|r| c.avoid_reagents.iter().any(|avoid| r.name.eq_ignore_ascii_case(avoid))))
    }

    /// Catálogo de plantillas aplicables al objetivo. Datos literales de
    /// reactivos, condiciones y rendimientos: configuración, no cómputo.
    fn candidate_routes(target: &SamAnalog) -> Result<Vec<SynthesisRoute>, EngineError> {
        let mut routes = Vec::new();
        if target.alkyl_group.size() == AlkylSize::Small {
            routes.push(direct_alkylation_route(target)?);
        }
        routes.push(boc_protected_route(target)?);
        routes.push(chemoenzymatic_route(target)?);
        if target.carboxyl_isostere == Isostere::Tetrazole {
            routes.push(tetrazole_route(target)?);
        }
        Ok(routes)
    }

    fn route_insights(route: &SynthesisRoute) -> Vec<RouteInsight> {
        route.steps()
             .iter()
             .filter(|s| s.enhanced)
             .map(|s| RouteInsight { description: format!("Transition state analysis for {}", s.name),
                                     confidence: 0.85,
                                     computational_details: "variational simulation, 16 qubits".to_string(),
                                     recommendation: format!("Optimal temperature: {}°C based on activation energy estimates", s.conditions.temperature_c) })
             .collect()
    }

    /// Análisis de costo por gramo: reactivos + mano de obra + equipamiento
    /// + recargo de purificación para pasos de bajo rendimiento, normalizado
    /// por el rendimiento global.
    fn analyze_costs(&self, route: &SynthesisRoute) -> CostAnalysis {
        let policy = &self.cost_policy;
        let reagent_costs: f64 = route.steps().iter().map(|s| s.reagents.iter().map(|r| r.cost).sum::<f64>()).sum();
        let labor_costs = route.total_time_h * policy.hourly_rate;
        let equipment_costs = route.steps().len() as f64 * policy.equipment_per_step;
        let purification_costs = route.steps().iter().filter(|s| s.expected_yield < policy.purification_yield_cutoff).count() as f64 * policy.purification_surcharge;

        let total_per_gram = (reagent_costs + labor_costs + equipment_costs + purification_costs) / (route.overall_yield() / 100.0);
        let economic_viability = if total_per_gram < policy.excellent_below {
            CostTier::Excellent
        } else if total_per_gram < policy.good_below {
            CostTier::Good
        } else if total_per_gram < policy.marginal_below {
            CostTier::Marginal
        } else {
            CostTier::Poor
        };

        CostAnalysis { reagent_costs,
                       labor_costs,
                       equipment_costs,
                       purification_costs,
                       total_per_gram,
                       economic_viability }
    }

    /// Riesgos de seguridad a partir de etiquetas de peligrosidad y riesgos
    /// técnicos por pasos de rendimiento bajo.
    fn assess_risks(route: &SynthesisRoute) -> RiskAssessment {
        let mut technical_risks = Vec::new();
        let mut safety_risks = Vec::new();

        for step in route.steps() {
            for reagent in &step.reagents {
                for hazard in &reagent.hazards {
                    match hazard.as_str() {
                        "explosive" => safety_risks.push(Risk { description: format!("{} is explosive", reagent.name),
                                                                probability: RiskProbability::Low,
                                                                impact: RiskImpact::Severe,
                                                                mitigation: "Use blast shield, small scale, proper training".to_string() }),
                        "toxic" => safety_risks.push(Risk { description: format!("{} is toxic", reagent.name),
                                                            probability: RiskProbability::Medium,
                                                            impact: RiskImpact::Moderate,
                                                            mitigation: "Use fume hood, proper PPE".to_string() }),
                        "flammable" => safety_risks.push(Risk { description: format!("{} is flammable", reagent.name),
                                                                probability: RiskProbability::Medium,
                                                                impact: RiskImpact::Moderate,
                                                                mitigation: "Keep away from ignition sources, ground equipment".to_string() }),
                        "corrosive" => safety_risks.push(Risk { description: format!("{} is corrosive", reagent.name),
                                                                probability: RiskProbability::Medium,
                                                                impact: RiskImpact::Minor,
                                                                mitigation: "Acid-resistant gloves and face shield".to_string() }),
                        _ => {}
                    }
                }
            }
            if step.expected_yield < 70.0 {
                technical_risks.push(Risk { description: format!("Low yield in {}", step.name),
                                            probability: RiskProbability::Medium,
                                            impact: RiskImpact::Moderate,
                                            mitigation: "Optimize conditions, consider alternatives".to_string() });
            }
        }

        RiskAssessment { technical_risks,
                         safety_risks,
                         regulatory_considerations: vec!["Handle azides per institutional safety protocols".to_string(),
                                                         "Dispose of heavy metals properly".to_string()],
                         mitigation_strategies: vec!["Start at small scale".to_string(),
                                                     "Use standard operating procedures".to_string(),
                                                     "Training required for all personnel".to_string()] }
    }

    fn scale_up_recommendations(route: &SynthesisRoute) -> Vec<String> {
        let mut recommendations = Vec::new();
        if route.green_chemistry_score < 50.0 {
            recommendations.push("Consider solvent recycling to improve green chemistry metrics".to_string());
        }
        if route.steps().iter().any(|s| s.conditions.temperature_c < -50.0) {
            recommendations.push("Cryogenic steps may be challenging at scale - consider alternative conditions".to_string());
        }
        if route.steps().iter().any(|s| s.reagents.iter().any(|r| r.hazards.iter().any(|h| h == "explosive"))) {
            recommendations.push("Implement continuous flow chemistry for hazardous steps".to_string());
        }
        recommendations.push("Establish analytical methods for in-process control".to_string());
        recommendations.push("Validate purification methods at target scale".to_string());
        recommendations
    }
}

impl Default for RouteOptimizer {
    fn default() -> Self {
        RouteOptimizer::new(CostPolicy::default())
    }
}

// ---------------------------------------------------------------------------
// Plantillas del catálogo (datos literales).
// ---------------------------------------------------------------------------

fn direct_alkylation_route(target: &SamAnalog) -> Result<SynthesisRoute, EngineError> {
    let steps = vec![RouteStep { step_number: 1,
                                 name: "Disulfide Reduction and Alkylation".to_string(),
                                 reaction: "Na/NH3 reduction followed by alkylation".to_string(),
                                 reagents: vec![Reagent::new("L,L-homocystine", 1.0, "mmol", 99.0, 50.0, &[]),
                                                Reagent::new("Sodium metal", 4.0, "mmol", 99.0, 10.0, &["flammable", "reactive"]),
                                                Reagent::new("Alkyl halide", 2.2, "mmol", 98.0, 30.0, &["irritant"])],
                                 conditions: StepConditions::new(-78.0, 7.0, "NH3(l)", 2.0, "N2"),
                                 expected_yield: 65.0,
                                 enhanced: false,
                                 critical_parameters: vec!["Temperature control".to_string(),
                                                           "Sodium stoichiometry".to_string(),
                                                           "Alkyl halide addition rate".to_string()],
                                 troubleshooting: vec!["Low yield: ensure dry conditions".to_string(), "Side products: reduce temperature".to_string()] }];
    Ok(SynthesisRoute::new(&format!("direct_{}", target.id), "Direct S-Alkylation", steps, 4.0, 90.0, 30.0, 0.7)?)
}

fn boc_protected_route(target: &SamAnalog) -> Result<SynthesisRoute, EngineError> {
    let steps = vec![RouteStep { step_number: 1,
                                 name: "N-Boc Protection".to_string(),
                                 reaction: "Boc anhydride protection of amine".to_string(),
                                 reagents: vec![Reagent::new("L,L-homocystine", 1.0, "mmol", 99.0, 50.0, &[]),
                                                Reagent::new("(Boc)2O", 2.5, "mmol", 99.0, 40.0, &[]),
                                                Reagent::new("NaOH", 2.0, "mmol", 99.0, 5.0, &["corrosive"])],
                                 conditions: StepConditions::new(0.0, 10.0, "dioxane/H2O", 12.0, "air"),
                                 expected_yield: 95.0,
                                 enhanced: false,
                                 critical_parameters: vec!["pH control".to_string(), "Temperature".to_string()],
                                 troubleshooting: vec!["Incomplete protection: extend reaction time".to_string()] },
                     RouteStep { step_number: 2,
                                 name: "S-Alkylation".to_string(),
                                 reaction: "Reduction and alkylation".to_string(),
                                 reagents: vec![Reagent::new("N,N-Boc-homocystine", 1.0, "mmol", 95.0, 0.0, &[]),
                                                Reagent::new("Sodium", 4.0, "mmol", 99.0, 10.0, &["flammable"]),
                                                Reagent::new("Alkyl halide", 2.2, "mmol", 98.0, 30.0, &[])],
                                 conditions: StepConditions::new(-78.0, 7.0, "NH3(l)", 2.0, "N2"),
                                 expected_yield: 85.0,
                                 enhanced: true,
                                 critical_parameters: vec!["Anhydrous conditions".to_string(), "Temperature".to_string()],
                                 troubleshooting: vec!["Use fresh sodium".to_string()] },
                     RouteStep { step_number: 3,
                                 name: "Boc Deprotection".to_string(),
                                 reaction: "Acidic deprotection".to_string(),
                                 reagents: vec![Reagent::new("N-Boc-S-alkyl-Met", 1.0, "mmol", 90.0, 0.0, &[]),
                                                Reagent::new("TFA", 10.0, "mL", 99.0, 20.0, &["corrosive"])],
                                 conditions: StepConditions::new(25.0, 1.0, "CH2Cl2", 1.0, "air"),
                                 expected_yield: 95.0,
                                 enhanced: false,
                                 critical_parameters: vec!["Reaction time".to_string()],
                                 troubleshooting: vec![] }];
    Ok(SynthesisRoute::new(&format!("boc_{}", target.id), "Boc-Protected Alkylation", steps, 18.0, 155.0, 50.0, 0.85)?)
}

fn chemoenzymatic_route(target: &SamAnalog) -> Result<SynthesisRoute, EngineError> {
    let steps = vec![RouteStep { step_number: 1,
                                 name: "Methionine Analog Preparation".to_string(),
                                 reaction: "Chemical synthesis or purchase".to_string(),
                                 reagents: vec![Reagent::new("S-alkyl-L-methionine", 1.0, "mmol", 95.0, 100.0, &[])],
                                 conditions: StepConditions::new(25.0, 7.0, "H2O", 0.0, "air"),
                                 expected_yield: 100.0,
                                 enhanced: false,
                                 critical_parameters: vec![],
                                 troubleshooting: vec![] },
                     RouteStep { step_number: 2,
                                 name: "Enzymatic SAM Analog Synthesis".to_string(),
                                 reaction: "MAT-catalyzed adenosylation".to_string(),
                                 reagents: vec![Reagent::new("S-alkyl-L-methionine", 1.0, "mmol", 95.0, 0.0, &[]),
                                                Reagent::new("ATP", 1.5, "mmol", 99.0, 200.0, &[]),
                                                Reagent::new("hMAT2A", 0.01, "mmol", 95.0, 500.0, &[]),
                                                Reagent::new("MgCl2", 5.0, "mmol", 99.0, 5.0, &[])],
                                 conditions: StepConditions::new(37.0, 7.5, "Tris-HCl", 4.0, "air"),
                                 expected_yield: 80.0,
                                 enhanced: true,
                                 critical_parameters: vec!["Enzyme concentration".to_string(),
                                                           "ATP stoichiometry".to_string(),
                                                           "pH".to_string(),
                                                           "Temperature".to_string()],
                                 troubleshooting: vec!["Low conversion: increase enzyme".to_string(),
                                                       "Degradation: reduce time and purify quickly".to_string()] }];
    Ok(SynthesisRoute::new(&format!("enzymatic_{}", target.id), "Chemoenzymatic MAT Route", steps, 6.0, 805.0, 90.0, 0.9)?)
}

fn tetrazole_route(target: &SamAnalog) -> Result<SynthesisRoute, EngineError> {
    let steps = vec![RouteStep { step_number: 1,
                                 name: "Boc Protection".to_string(),
                                 reaction: "(Boc)2O, pyridine, NH4HCO3".to_string(),
                                 reagents: vec![Reagent::new("L-methionine", 10.0, "mmol", 99.0, 20.0, &[]),
                                                Reagent::new("(Boc)2O", 12.0, "mmol", 99.0, 50.0, &[]),
                                                Reagent::new("Pyridine", 50.0, "mL", 99.0, 30.0, &["toxic"]),
                                                Reagent::new("NH4HCO3", 15.0, "mmol", 99.0, 5.0, &[])],
                                 conditions: StepConditions::new(25.0, 8.0, "pyridine", 5.0, "air"),
                                 expected_yield: 97.0,
                                 enhanced: false,
                                 critical_parameters: vec!["Stoichiometry".to_string(), "Reaction time".to_string()],
                                 troubleshooting: vec!["Incomplete: add more Boc2O".to_string()] },
                     RouteStep { step_number: 2,
                                 name: "Nitrile Formation".to_string(),
                                 reaction: "(TFA)2O/pyridine dehydration".to_string(),
                                 reagents: vec![Reagent::new("N-Boc-Met", 10.0, "mmol", 97.0, 0.0, &[]),
                                                Reagent::new("(TFA)2O", 15.0, "mmol", 99.0, 100.0, &["corrosive"]),
                                                Reagent::new("Pyridine", 15.0, "mL", 99.0, 10.0, &["toxic"])],
                                 conditions: StepConditions::new(0.0, 7.0, "THF", 3.0, "N2"),
                                 expected_yield: 97.0,
                                 enhanced: true,
                                 critical_parameters: vec!["Temperature control (0°C)".to_string(), "Anhydrous conditions".to_string()],
                                 troubleshooting: vec!["Low yield: ensure dry THF".to_string(), "Side products: control temperature".to_string()] },
                     RouteStep { step_number: 3,
                                 name: "Tetrazole Formation".to_string(),
                                 reaction: "NaN3/ZnBr2 [3+2] cycloaddition".to_string(),
                                 reagents: vec![Reagent::new("N-Boc-Met-CN", 10.0, "mmol", 97.0, 0.0, &[]),
                                                Reagent::new("NaN3", 15.0, "mmol", 99.0, 20.0, &["toxic", "explosive"]),
                                                Reagent::new("ZnBr2", 10.0, "mmol", 99.0, 40.0, &[])],
                                 conditions: StepConditions::new(80.0, 7.0, "H2O/2-propanol (2:1)", 16.0, "N2"),
                                 expected_yield: 87.0,
                                 enhanced: true,
                                 critical_parameters: vec!["Temperature (80°C)".to_string(),
                                                           "NaN3 handling safety".to_string(),
                                                           "Reaction time".to_string()],
                                 troubleshooting: vec!["Incomplete: extend time".to_string(), "Safety: use blast shield".to_string()] },
                     RouteStep { step_number: 4,
                                 name: "Amine Deprotection".to_string(),
                                 reaction: "Et2NH deprotection".to_string(),
                                 reagents: vec![Reagent::new("Protected tMet", 10.0, "mmol", 87.0, 0.0, &[]),
                                                Reagent::new("Et2NH", 50.0, "mL", 99.0, 30.0, &["flammable"])],
                                 conditions: StepConditions::new(25.0, 10.0, "CH2Cl2", 0.5, "air"),
                                 expected_yield: 79.0,
                                 enhanced: false,
                                 critical_parameters: vec!["Reaction time".to_string()],
                                 troubleshooting: vec!["Incomplete: extend time slightly".to_string()] }];
    Ok(SynthesisRoute::new(&format!("tetrazole_{}", target.id), "Tetrazole Methionine (tMet) Synthesis", steps, 26.0, 305.0, 40.0, 0.8)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sam_domain::AlkylGroup;

    fn analog(alkyl: AlkylGroup, isostere: Isostere) -> SamAnalog {
        SamAnalog::derive("SAM", alkyl, isostere, false)
    }

    fn flat_route(id: &str, yield_pct: f64) -> SynthesisRoute {
        let step = RouteStep { step_number: 1,
                               name: "only".to_string(),
                               reaction: "test".to_string(),
                               reagents: vec![],
                               conditions: StepConditions::new(25.0, 7.0, "H2O", 1.0, "air"),
                               expected_yield: yield_pct,
                               enhanced: false,
                               critical_parameters: vec![],
                               troubleshooting: vec![] };
        SynthesisRoute::new(id, id, vec![step], 10.0, 100.0, 50.0, 0.8).unwrap()
    }

    #[test]
    fn higher_yield_scores_strictly_higher() {
        let a = flat_route("a", 80.0);
        let b = flat_route("b", 60.0);
        assert!(RouteOptimizer::score_route(&a) > RouteOptimizer::score_route(&b));
    }

    #[test]
    fn enhanced_bonus_can_exceed_hundred() {
        // Ruta ideal en todos los criterios más pasos afinados: el puntaje
        // supera 100 y el exceso se conserva.
        let steps: Vec<RouteStep> = (1..=3).map(|n| RouteStep { step_number: n,
                                                                name: format!("s{}", n),
                                                                reaction: "x".to_string(),
                                                                reagents: vec![],
                                                                conditions: StepConditions::new(25.0, 7.0, "H2O", 0.1, "air"),
                                                                expected_yield: 100.0,
                                                                enhanced: true,
                                                                critical_parameters: vec![],
                                                                troubleshooting: vec![] })
                                           .collect();
        let route = SynthesisRoute::new("ideal", "ideal", steps, 0.0, 0.0, 100.0, 1.0).unwrap();
        assert!((RouteOptimizer::score_route(&route) - 106.0).abs() < 1e-9);
    }

    #[test]
    fn tetrazole_target_gets_its_template() {
        let result = RouteOptimizer::default().optimize_route(&analog(AlkylGroup::Methyl, Isostere::Tetrazole), None).unwrap();
        let ids: Vec<&str> = std::iter::once(result.optimized_route.id.as_str()).chain(result.alternatives.iter().map(|r| r.id.as_str()))
                                                                                .collect();
        assert!(ids.iter().any(|id| id.starts_with("tetrazole_")));
        // Catálogo completo: directa + boc + enzimática + tetrazol.
        assert_eq!(ids.len(), 4);
    }

    #[test]
    fn large_alkyl_skips_direct_route() {
        let result = RouteOptimizer::default().optimize_route(&analog(AlkylGroup::Benzyl, Isostere::Amide), None).unwrap();
        let ids: Vec<&str> = std::iter::once(result.optimized_route.id.as_str()).chain(result.alternatives.iter().map(|r| r.id.as_str()))
                                                                                .collect();
        assert!(ids.iter().all(|id| !id.starts_with("direct_")));
    }

    #[test]
    fn unsatisfiable_constraints_are_an_explicit_error() {
        let constraints = RouteConstraints { min_yield: Some(99.9), ..Default::default() };
        let err = RouteOptimizer::default().optimize_route(&analog(AlkylGroup::Methyl, Isostere::Carboxylate), Some(&constraints));
        assert!(matches!(err, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn explosive_reagents_surface_as_severe_safety_risk() {
        let result = RouteOptimizer::default().optimize_route(&analog(AlkylGroup::Methyl, Isostere::Tetrazole), None).unwrap();
        let all_safety: Vec<&Risk> = result.risk_assessment.safety_risks.iter().collect();
        // NaN3 está etiquetado explosivo en la ruta de tetrazol; si esa ruta
        // ganó el ranking, el riesgo severo debe estar presente.
        if result.optimized_route.id.starts_with("tetrazole_") {
            assert!(all_safety.iter().any(|r| r.impact == RiskImpact::Severe));
        }
    }

    #[test]
    fn cost_analysis_normalizes_by_yield() {
        let policy = CostPolicy::default();
        let optimizer = RouteOptimizer::new(policy);
        let result = optimizer.optimize_route(&analog(AlkylGroup::Methyl, Isostere::Carboxylate), None).unwrap();
        let c = &result.cost_analysis;
        let gross = c.reagent_costs + c.labor_costs + c.equipment_costs + c.purification_costs;
        let expected = gross / (result.optimized_route.overall_yield() / 100.0);
        assert!((c.total_per_gram - expected).abs() < 1e-9);
    }

    #[test]
    fn low_yield_steps_flag_technical_risk() {
        let result = RouteOptimizer::default().optimize_route(&analog(AlkylGroup::Methyl, Isostere::Carboxylate), None).unwrap();
        // La evaluación de riesgo se calcula para la ruta ganadora.
        let has_low_yield_step = result.optimized_route.steps().iter().any(|s| s.expected_yield < 70.0);
        assert_eq!(!result.risk_assessment.technical_risks.is_empty(), has_low_yield_step);
    }
}
