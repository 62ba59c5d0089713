//! Rutas de síntesis multi-paso.
//!
//! Una `SynthesisRoute` es una secuencia ordenada y no vacía de pasos con
//! datos literales de reactivos y condiciones; sus agregados se derivan en el
//! constructor. Invariante central: `overall_yield` es siempre el producto de
//! los rendimientos por paso (en porcentaje), dentro de tolerancia de punto
//! flotante. Una ruta sin pasos es inválida.

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Reactivo con costo y etiquetas de peligrosidad para el análisis de riesgo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reagent {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    /// Pureza en porcentaje.
    pub purity: f64,
    /// Costo en USD para la escala de referencia.
    pub cost: f64,
    /// Etiquetas: "explosive", "toxic", "flammable", "corrosive", ...
    pub hazards: Vec<String>,
}

impl Reagent {
    pub fn new(name: &str, amount: f64, unit: &str, purity: f64, cost: f64, hazards: &[&str]) -> Self {
        Reagent { name: name.to_string(),
                  amount,
                  unit: unit.to_string(),
                  purity,
                  cost,
                  hazards: hazards.iter().map(|h| h.to_string()).collect() }
    }
}

/// Condiciones de reacción de un paso.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepConditions {
    pub temperature_c: f64,
    pub ph: f64,
    pub medium: String,
    /// Duración de la reacción en horas.
    pub reaction_time_h: f64,
    pub atmosphere: String,
}

impl StepConditions {
    pub fn new(temperature_c: f64, ph: f64, medium: &str, reaction_time_h: f64, atmosphere: &str) -> Self {
        StepConditions { temperature_c,
                         ph,
                         medium: medium.to_string(),
                         reaction_time_h,
                         atmosphere: atmosphere.to_string() }
    }
}

/// Paso individual de una ruta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub step_number: u32,
    pub name: String,
    pub reaction: String,
    pub reagents: Vec<Reagent>,
    pub conditions: StepConditions,
    /// Rendimiento esperado en porcentaje (0-100).
    pub expected_yield: f64,
    /// Marca si el paso fue afinado con el evaluador mejorado; cada paso
    /// marcado aporta un bono fijo al puntaje de la ruta.
    pub enhanced: bool,
    pub critical_parameters: Vec<String>,
    pub troubleshooting: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRoute {
    pub id: String,
    pub name: String,
    steps: Vec<RouteStep>,
    /// Producto de rendimientos por paso, en porcentaje. Derivado.
    overall_yield: f64,
    /// Tiempo total en horas, incluyendo workup (dato de catálogo).
    pub total_time_h: f64,
    /// Costo total en USD (dato de catálogo).
    pub total_cost_usd: f64,
    /// Puntaje de química verde, 0-100.
    pub green_chemistry_score: f64,
    /// Reproducibilidad estimada, 0-1.
    pub reproducibility: f64,
}

impl SynthesisRoute {
    /// Construye la ruta validando que tenga al menos un paso y derivando
    /// `overall_yield` como producto de los rendimientos por paso.
    pub fn new(id: &str,
               name: &str,
               steps: Vec<RouteStep>,
               total_time_h: f64,
               total_cost_usd: f64,
               green_chemistry_score: f64,
               reproducibility: f64)
               -> Result<Self, DomainError> {
        if steps.is_empty() {
            return Err(DomainError::Validation(format!("route '{}' has no steps", id)));
        }
        let overall_yield = steps.iter().fold(100.0, |acc, s| acc * s.expected_yield / 100.0);
        Ok(SynthesisRoute { id: id.to_string(),
                            name: name.to_string(),
                            steps,
                            overall_yield,
                            total_time_h,
                            total_cost_usd,
                            green_chemistry_score,
                            reproducibility })
    }

    pub fn steps(&self) -> &[RouteStep] {
        &self.steps
    }

    pub fn overall_yield(&self) -> f64 {
        self.overall_yield
    }

    /// Pasos marcados como afinados por el evaluador mejorado.
    pub fn enhanced_step_count(&self) -> usize {
        self.steps.iter().filter(|s| s.enhanced).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(n: u32, yield_pct: f64, enhanced: bool) -> RouteStep {
        RouteStep { step_number: n,
                    name: format!("step {}", n),
                    reaction: "test".to_string(),
                    reagents: vec![Reagent::new("A", 1.0, "mmol", 99.0, 10.0, &[])],
                    conditions: StepConditions::new(25.0, 7.0, "H2O", 1.0, "air"),
                    expected_yield: yield_pct,
                    enhanced,
                    critical_parameters: vec![],
                    troubleshooting: vec![] }
    }

    #[test]
    fn overall_yield_is_product_of_step_yields() {
        let r = SynthesisRoute::new("r1", "test", vec![step(1, 97.0, false), step(2, 97.0, true), step(3, 87.0, true), step(4, 79.0, false)], 26.0, 305.0, 40.0, 0.8).unwrap();
        let expected = 100.0 * 0.97 * 0.97 * 0.87 * 0.79;
        assert!((r.overall_yield() - expected).abs() < 1e-9);
        assert_eq!(r.enhanced_step_count(), 2);
    }

    #[test]
    fn empty_route_is_invalid() {
        let r = SynthesisRoute::new("r0", "empty", vec![], 0.0, 0.0, 0.0, 0.0);
        assert!(r.is_err());
    }
}
