use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Error cargando el modelo: {0}")]
    ModelLoad(String),
    #[error("Frame mal formado: {0}")]
    Decode(String),
    #[error("Entrada inválida: {0}")]
    Validation(String),
    #[error("Error de inferencia: {0}")]
    Inference(String),
    #[error("No se obtuvo ninguna predicción válida")]
    NoValidPredictions,
    #[error("Error de actuación: {0}")]
    Actuation(#[from] ActuationFailure),
    #[error("Error de transporte: {0}")]
    Transport(String),
}

/// Fallos del envío a la bomba. Sólo se distinguen para los logs.
#[derive(Debug, Error)]
pub enum ActuationFailure {
    #[error("dispositivo inalcanzable: {0}")]
    Unreachable(String),
    #[error("el dispositivo respondió con estado {0}")]
    Rejected(u16),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl From<image::ImageError> for DomainError {
    fn from(e: image::ImageError) -> Self {
        DomainError::Inference(format!("imagen ilegible: {e}"))
    }
}
