use thiserror::Error;

/// Errors returned by the blob store
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// Any other non-success answer from the blob service
    #[error("blob service returned {status} ({code}): {message}")]
    Remote {
        status: u16,
        code: String,
        message: String,
    },

    #[error("credential error: {0}")]
    Credential(String),

    #[error("invalid blob store configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport, serialization or credential failures inside the storage SDK
    #[error("blob service request failed: {0}")]
    Transport(#[from] azure_core::Error),
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }

    /// HTTP status reported by the remote service, if there was one
    pub fn remote_status(&self) -> Option<u16> {
        match self {
            StorageError::NotFound { .. } => Some(404),
            StorageError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;
