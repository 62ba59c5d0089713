//! Errores del motor.
//!
//! Taxonomía: configuración (servicios externos ausentes o mal formados; la
//! computación nunca debe abortar por esto, solo degradar), entrada inválida
//! (lote vacío, objetivo sin plantilla aplicable) e interno. La no
//! convergencia del camino simulado NO es un error: se recupera localmente
//! con un resultado de confianza reducida.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuración externa ausente o inválida. Deshabilita la cache, nunca
    /// aborta un cálculo.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Violación de contrato del llamador (lote vacío, objetivo sin
    /// plantilla de síntesis aplicable).
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("domain error: {0}")]
    Domain(#[from] sam_domain::DomainError),
    #[error("internal: {0}")]
    Internal(String),
}
