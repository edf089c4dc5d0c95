//! Server application state

use blob_store::BlobStore;
use document_store::DocumentStore;
use std::sync::Arc;

/// Long-lived store clients shared by every worker
pub struct AppState {
    pub blobs: Arc<dyn BlobStore>,
    pub documents: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(blobs: Arc<dyn BlobStore>, documents: Arc<dyn DocumentStore>) -> Self {
        Self { blobs, documents }
    }
}
