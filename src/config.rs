//! Configuración central de la aplicación.
//! Carga variables de entorno (.env) y expone una estructura inmutable
//! (`CONFIG`) con valores por defecto seguros: ninguna variable es
//! obligatoria y un valor mal formado cae al default en lugar de abortar.
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

use sam_engine::{EvaluatorConfig, ScreeningThresholds};

/// Configuración global de la aplicación.
pub struct AppConfig {
    /// Parámetros del evaluador de energía.
    pub engine: EngineConfig,
    /// Umbrales del cribado de candidatos.
    pub screening: ScreeningConfig,
}

pub struct EngineConfig {
    pub max_qubits: u32,
    pub max_iterations: u32,
    pub error_mitigation: bool,
    /// Si la cache de energía está habilitada en este proceso.
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub seed: u64,
}

pub struct ScreeningConfig {
    pub proceed_above: f64,
    pub optimize_above: f64,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Instancia global perezosa de configuración, evaluada una sola vez.
pub static CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    dotenvy::dotenv().ok();
    AppConfig { engine: EngineConfig { max_qubits: env_parse("SAMFLOW_MAX_QUBITS", 32),
                                       max_iterations: env_parse("SAMFLOW_MAX_ITERATIONS", 100),
                                       error_mitigation: env_parse("SAMFLOW_ERROR_MITIGATION", true),
                                       cache_enabled: env_parse("SAMFLOW_CACHE_ENABLED", true),
                                       cache_ttl_secs: env_parse("SAMFLOW_CACHE_TTL_SECS", 86_400),
                                       seed: env_parse("SAMFLOW_SEED", 0) },
                screening: ScreeningConfig { proceed_above: env_parse("SAMFLOW_PROCEED_ABOVE", 50.0),
                                             optimize_above: env_parse("SAMFLOW_OPTIMIZE_ABOVE", 10.0) } }
});

impl EngineConfig {
    pub fn evaluator_config(&self) -> EvaluatorConfig {
        EvaluatorConfig { max_qubits: self.max_qubits,
                          max_iterations: self.max_iterations,
                          error_mitigation: self.error_mitigation,
                          cache_ttl: Duration::from_secs(self.cache_ttl_secs),
                          seed: self.seed }
    }
}

impl ScreeningConfig {
    pub fn thresholds(&self) -> ScreeningThresholds {
        ScreeningThresholds { proceed_above: self.proceed_above, optimize_above: self.optimize_above }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        std::env::set_var("SAMFLOW_TEST_BOGUS", "not-a-number");
        let v: u32 = env_parse("SAMFLOW_TEST_BOGUS", 7);
        assert_eq!(v, 7);
    }

    #[test]
    fn absent_values_use_defaults() {
        let v: u64 = env_parse("SAMFLOW_TEST_ABSENT", 86_400);
        assert_eq!(v, 86_400);
    }
}
