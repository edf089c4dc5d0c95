use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use blob_store::StorageError;
use common::ServiceResponse;
use document_store::DocumentError;
use thiserror::Error;
use tracing::error;

/// Error returned by every handler. The body is always the `ServiceResponse` envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unhandled(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ServiceResponse::<()>::error(self.to_string()))
    }
}

/// Helper function for bad request errors
pub fn invalid_input(msg: impl Into<String>) -> ApiError {
    let msg = msg.into();
    error!("{}", msg);
    ApiError::InvalidInput(msg)
}

/// Helper function for not found errors
pub fn not_found(msg: impl Into<String>) -> ApiError {
    let msg = msg.into();
    error!("{}", msg);
    ApiError::NotFound(msg)
}

/// Helper function for server errors. Used where every fault is reported as a 500.
pub fn server_error<E: std::fmt::Display>(msg: &str, e: E) -> ApiError {
    error!("{}: {}", msg, e);
    ApiError::Unhandled(format!("{}: {}", msg, e))
}

/// Map a blob store fault to its HTTP bucket
pub fn storage_error(msg: &str, e: StorageError) -> ApiError {
    match e {
        StorageError::NotFound { .. } => not_found(format!("{}: {}", msg, e)),
        StorageError::InvalidRequest(_) => invalid_input(format!("{}: {}", msg, e)),
        other => server_error(msg, other),
    }
}

/// Map a document store fault to its HTTP bucket
pub fn document_error(msg: &str, e: DocumentError) -> ApiError {
    match e {
        DocumentError::NotFound { .. } => not_found(format!("{}: {}", msg, e)),
        DocumentError::InvalidRequest(_) => invalid_input(format!("{}: {}", msg, e)),
        other => server_error(msg, other),
    }
}
