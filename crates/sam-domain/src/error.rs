use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validación fallida: {0}")]
    Validation(String),
    #[error("Elemento desconocido: {0}")]
    UnknownElement(String),
}
