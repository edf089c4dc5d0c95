use thiserror::Error;

/// Errors returned by the document store
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("document service returned {status} ({code}): {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },

    #[error("invalid document store configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to sign request: {0}")]
    Signing(String),

    #[error("document service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid JSON from document service: {0}")]
    Json(#[from] serde_json::Error),
}

impl DocumentError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentError::NotFound { .. })
    }
}

pub type Result<T, E = DocumentError> = std::result::Result<T, E>;
