//! Storage Client Adapter: one-to-one mapping from gateway operations to
//! Azure Blob Storage calls.

pub mod azure;
pub mod backend;
pub mod error;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

pub use backend::{BlobBackend, BlobStoreOptions, PublicAccess};
pub use common::{BlobItem, BlobMetadata, ContainerProperties};
pub use error::{Result, StorageError};

/// Body of a downloaded blob, streamed straight from the remote response
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// A blob being downloaded
pub struct BlobDownload {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub stream: ByteStream,
}

/// Blob store operations. Blob-level calls target the configured default container.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload (overwrite) a blob and return its URL
    async fn upload(&self, blob_name: &str, content: Bytes, content_type: Option<&str>)
        -> Result<String>;

    /// Download a blob. A missing blob is `StorageError::NotFound`.
    async fn download(&self, blob_name: &str) -> Result<BlobDownload>;

    /// Delete a blob and its snapshots. Returns `false` if the blob did not exist.
    async fn delete(&self, blob_name: &str) -> Result<bool>;

    /// Write the zero-byte placeholder for a virtual directory and return its URL
    async fn create_directory(&self, directory_name: &str) -> Result<String>;

    /// Create a container. Returns `false` if it already existed.
    async fn create_container(&self, container_name: &str) -> Result<bool>;

    /// Lazily walk every page of a container listing
    fn list_blobs<'a>(&'a self, container_name: &'a str) -> BoxStream<'a, Result<BlobItem>>;

    async fn container_properties(&self, container_name: &str) -> Result<ContainerProperties>;

    async fn get_metadata(&self, blob_name: &str) -> Result<BlobMetadata>;

    /// Replace the blob's metadata
    async fn set_metadata(&self, blob_name: &str, metadata: &BlobMetadata) -> Result<()>;

    /// Start a server-side copy and return the destination URL without waiting for it
    async fn copy_blob(&self, source_blob_name: &str, destination_blob_name: &str)
        -> Result<String>;

    /// Snapshot a blob and return the opaque snapshot token
    async fn create_snapshot(&self, blob_name: &str) -> Result<String>;
}
