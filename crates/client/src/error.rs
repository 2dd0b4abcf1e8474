use enterprisepro_core::DomainError;
use thiserror::Error;

/// Failure of a persisted key/value operation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("stored value is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Failure of a backend request.
///
/// A 401 is not an error: it is handled by the refresh/logout flow and
/// surfaces as `Ok(None)` from [`crate::ApiClient::request`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApiError {
    /// Human-readable text for an error toast.
    pub fn message(&self) -> String {
        match self {
            ApiError::Api { message, .. } => message.clone(),
            ApiError::Network(msg) => format!("Error de conexión: {msg}"),
            ApiError::Parse(msg) => format!("Respuesta inválida del servidor: {msg}"),
            ApiError::Storage(err) => err.to_string(),
            ApiError::Domain(err) => err.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ApiError::Network(_))
    }
}
