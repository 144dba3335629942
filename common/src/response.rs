use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::snapshot::{SnapshotError, StatusSnapshot};

/// Envelope que devuelve el endpoint de estado.
///
/// El código HTTP no alcanza para señalar errores (el endpoint siempre
/// responde 200), por eso va un `success` explícito:
/// - `{"success": true, "status": {...}}`
/// - `{"success": false, "message": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvelopeError {
    /// El proveedor respondió `success: false`.
    #[error("{0}")]
    Rejected(String),

    #[error("Unexpected response body format.")]
    Malformed,

    #[error("invalid status snapshot: {0}")]
    InvalidSnapshot(#[from] SnapshotError),
}

impl StatusResponse {
    pub fn ok(status: StatusSnapshot) -> Self {
        Self {
            success: true,
            status: Some(status),
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            status: None,
            message: Some(message.into()),
        }
    }

    /// Parsea un cuerpo JSON crudo. Cualquier forma que no sea el envelope
    /// es `Malformed`.
    pub fn parse(body: &[u8]) -> Result<StatusSnapshot, EnvelopeError> {
        let resp: StatusResponse =
            serde_json::from_slice(body).map_err(|_| EnvelopeError::Malformed)?;
        resp.into_snapshot()
    }

    pub fn into_snapshot(self) -> Result<StatusSnapshot, EnvelopeError> {
        match (self.success, self.status, self.message) {
            (true, Some(status), _) => {
                status.validate()?;
                Ok(status)
            }
            (false, _, Some(message)) => Err(EnvelopeError::Rejected(message)),
            _ => Err(EnvelopeError::Malformed),
        }
    }
}
