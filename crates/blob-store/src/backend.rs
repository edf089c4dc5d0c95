use crate::azure::AzureBlobStore;
use crate::error::{Result, StorageError};
use crate::BlobStore;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

/// Anonymous read access granted on containers this gateway creates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublicAccess {
    Private,
    /// Blob data is readable anonymously, container listing is not
    #[default]
    Blob,
    Container,
}

impl FromStr for PublicAccess {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" | "none" => Ok(PublicAccess::Private),
            "blob" => Ok(PublicAccess::Blob),
            "container" => Ok(PublicAccess::Container),
            other => Err(format!(
                "Invalid public access level '{}'. Must be 'private', 'blob' or 'container'",
                other
            )),
        }
    }
}

/// Settings shared by both authentication strategies
#[derive(Debug, Clone)]
pub struct BlobStoreOptions {
    /// Default container targeted by blob-level operations
    pub container_name: String,
    /// Create the default container on first upload or directory creation
    pub auto_create_container: bool,
    pub public_access: PublicAccess,
}

/// Blob store authentication strategy
pub enum BlobBackend {
    /// Account key auth from a `Key=Value;...` connection string
    ConnectionString(String),
    /// Bearer tokens from the ambient credential chain against the account endpoint
    AmbientCredential { account_name: String },
}

impl BlobBackend {
    /// Initialize the blob store for this strategy
    pub async fn initialize(self, options: BlobStoreOptions) -> Result<Arc<dyn BlobStore>> {
        common::names::validate_container_name(&options.container_name).map_err(|e| {
            StorageError::InvalidConfig(format!(
                "default container '{}': {}",
                options.container_name, e
            ))
        })?;

        let store = match self {
            BlobBackend::ConnectionString(connection_string) => {
                AzureBlobStore::from_connection_string(&connection_string, options)?
            }
            BlobBackend::AmbientCredential { account_name } => {
                AzureBlobStore::with_ambient_credential(&account_name, options)?
            }
        };
        info!(
            endpoint = %store.endpoint(),
            container = %store.default_container(),
            "Blob store initialized"
        );
        Ok(Arc::new(store))
    }
}

impl fmt::Debug for BlobBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobBackend::ConnectionString(raw) => f
                .debug_tuple("ConnectionString")
                .field(&common::connection_string::ConnectionString::parse(raw).ok())
                .finish(),
            BlobBackend::AmbientCredential { account_name } => f
                .debug_struct("AmbientCredential")
                .field("account_name", account_name)
                .finish(),
        }
    }
}
