use crate::constants::MAX_UPLOAD_SIZE;
use crate::handlers::error::invalid_input;
use actix_multipart::form::{tempfile::TempFile, MultipartForm, MultipartFormConfig};
use common::names;

/// Multipart form for blob upload
#[derive(MultipartForm)]
pub struct UploadForm {
    /// The file being uploaded; its file name becomes the blob name
    #[multipart(limit = "256MB")]
    pub file: TempFile,
}

impl UploadForm {
    /// Blob name taken from the uploaded part. Missing or empty parts are rejected.
    pub fn blob_name(&self) -> Result<String, String> {
        let name = self
            .file
            .file_name
            .as_deref()
            .filter(|name| !names::is_blank(name))
            .filter(|_| self.file.size > 0)
            .ok_or_else(|| "No file provided.".to_string())?;

        names::validate_blob_name(name).map_err(|e| e.message().to_string())?;
        Ok(name.to_string())
    }

    pub fn content_type(&self) -> Option<String> {
        self.file.content_type.as_ref().map(|mime| mime.to_string())
    }
}

/// Extractor config: size limit, and malformed forms answered with the error envelope
pub fn config() -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(MAX_UPLOAD_SIZE)
        .memory_limit(MAX_UPLOAD_SIZE)
        .error_handler(|err, _req| invalid_input(format!("Invalid upload form: {}", err)).into())
}
