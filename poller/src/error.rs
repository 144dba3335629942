use common::EnvelopeError;
use thiserror::Error;

/// Errores del motor y de los proveedores.
///
/// `Provider` y `MalformedResponse` se reintentan igual; la diferencia es sólo
/// informativa. `InvalidConfiguration` nunca se reintenta.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollError {
    /// La consulta falló (red, código HTTP, `success: false`...).
    #[error("{0}")]
    Provider(String),

    /// El proveedor devolvió algo fuera del envelope esperado.
    #[error("{0}")]
    MalformedResponse(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl PollError {
    pub fn provider(message: impl Into<String>) -> Self {
        PollError::Provider(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, PollError::InvalidConfiguration(_))
    }
}

impl From<EnvelopeError> for PollError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Rejected(message) => PollError::Provider(message),
            other => PollError::MalformedResponse(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for PollError {
    fn from(err: reqwest::Error) -> Self {
        PollError::Provider(err.to_string())
    }
}
