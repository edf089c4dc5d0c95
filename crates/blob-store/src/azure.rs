//! Azure Blob Storage through the storage SDK clients
//!
//! URL layout: `{endpoint}/{container}/{blob}`. The endpoint is either
//! `https://{account}.blob.{suffix}` or a path-style emulator endpoint such as
//! `http://127.0.0.1:10000/devstoreaccount1`.

use crate::backend::{BlobStoreOptions, PublicAccess};
use crate::error::{Result, StorageError};
use crate::{BlobDownload, BlobItem, BlobMetadata, BlobStore, ContainerProperties};
use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_core::request_options::Metadata;
use azure_storage::{CloudLocation, StorageCredentials};
use azure_storage_blobs::container::PublicAccess as ContainerAccess;
use azure_storage_blobs::prelude::{
    Blob, BlobClient, BlobServiceClient, ClientBuilder, ContainerClient, DeleteSnapshotsMethod,
};
use bytes::Bytes;
use common::connection_string::{ConnectionString, ConnectionStringError};
use common::names;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info};

// Well-known Azurite account
const DEVELOPMENT_ACCOUNT: &str = "devstoreaccount1";
const DEVELOPMENT_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEVELOPMENT_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// Account name and blob service root URL
#[derive(Debug, Clone, PartialEq, Eq)]
struct Endpoint {
    account: String,
    uri: String,
}

/// Blob store backed by an Azure storage account
pub struct AzureBlobStore {
    service: BlobServiceClient,
    endpoint: Endpoint,
    options: BlobStoreOptions,
    container_ready: AtomicBool,
}

impl fmt::Debug for AzureBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureBlobStore")
            .field("endpoint", &self.endpoint.uri)
            .field("options", &self.options)
            .finish()
    }
}

impl AzureBlobStore {
    /// Shared Key strategy. `UseDevelopmentStorage=true` targets the local emulator.
    pub fn from_connection_string(raw: &str, options: BlobStoreOptions) -> Result<Self> {
        let (endpoint, credentials) = parse_connection_string(raw)?;
        Ok(Self::new(endpoint, credentials, options))
    }

    /// Ambient credential chain (environment, workload identity, managed identity,
    /// Azure CLI) against `https://{account}.blob.core.windows.net`
    pub fn with_ambient_credential(account_name: &str, options: BlobStoreOptions) -> Result<Self> {
        if names::is_blank(account_name) {
            return Err(StorageError::InvalidConfig(
                "storage account name is required for identity auth".to_string(),
            ));
        }
        let account = account_name.trim().to_string();
        let credential =
            azure_identity::create_credential().map_err(|e| StorageError::Credential(e.to_string()))?;
        let endpoint = Endpoint {
            uri: format!("https://{}.blob.core.windows.net", account),
            account,
        };
        Ok(Self::new(
            endpoint,
            StorageCredentials::token_credential(credential),
            options,
        ))
    }

    fn new(endpoint: Endpoint, credentials: StorageCredentials, options: BlobStoreOptions) -> Self {
        let location = CloudLocation::Custom {
            account: endpoint.account.clone(),
            uri: endpoint.uri.clone(),
        };
        let service = ClientBuilder::with_location(location, credentials).blob_service_client();
        Self {
            service,
            endpoint,
            options,
            container_ready: AtomicBool::new(false),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint.uri
    }

    pub fn default_container(&self) -> &str {
        &self.options.container_name
    }

    fn container(&self, container_name: &str) -> ContainerClient {
        self.service.container_client(container_name)
    }

    fn blob(&self, blob_name: &str) -> BlobClient {
        self.container(&self.options.container_name)
            .blob_client(blob_name)
    }

    /// URL of a blob in the default container
    pub fn blob_url(&self, blob_name: &str) -> Result<String> {
        Ok(self.blob(blob_name).url()?.to_string())
    }

    /// Create the default container once, when auto-creation is enabled
    async fn ensure_container(&self) -> Result<()> {
        if !self.options.auto_create_container || self.container_ready.load(Ordering::Acquire) {
            return Ok(());
        }
        self.create_container(&self.options.container_name).await?;
        self.container_ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn put_block_blob(
        &self,
        blob_name: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> Result<String> {
        let blob = self.blob(blob_name);
        let mut request = blob.put_block_blob(content);
        if let Some(content_type) = content_type.filter(|t| !names::is_blank(t)) {
            request = request.content_type(content_type.to_string());
        }
        request
            .await
            .map_err(|e| service_error(e, || format!("container '{}'", self.options.container_name)))?;
        Ok(blob.url()?.to_string())
    }

    /// Every listing entry named exactly `blob_name`, metadata included.
    /// Listing keeps metadata names in the case the service stored them.
    async fn find_blob(&self, blob_name: &str, include_snapshots: bool) -> Result<Vec<Blob>> {
        let container_name = &self.options.container_name;
        let mut pages = self
            .container(container_name)
            .list_blobs()
            .prefix(blob_name.to_string())
            .include_metadata(true)
            .include_snapshots(include_snapshots)
            .into_stream();

        let mut found = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| service_error(e, || format!("container '{}'", container_name)))?;
            found.extend(page.blobs.blobs().filter(|b| b.name == blob_name).cloned());
        }
        Ok(found)
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn upload(
        &self,
        blob_name: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> Result<String> {
        self.ensure_container().await?;
        let size = content.len();
        let url = self.put_block_blob(blob_name, content, content_type).await?;
        info!(blob = ?blob_name, size, "Uploaded blob");
        Ok(url)
    }

    async fn download(&self, blob_name: &str) -> Result<BlobDownload> {
        // Chunked ranged reads; the first one decides whether the blob exists
        let mut chunks = self.blob(blob_name).get().into_stream();
        let first = match chunks.next().await {
            Some(chunk) => chunk.map_err(|e| service_error(e, || format!("blob '{}'", blob_name)))?,
            None => {
                return Err(StorageError::NotFound {
                    resource: format!("blob '{}'", blob_name),
                })
            }
        };

        let content_type = Some(first.blob.properties.content_type.clone()).filter(|t| !t.is_empty());
        let stream = stream::once(async move { Ok(first.data) })
            .chain(chunks.map_ok(|chunk| chunk.data))
            .try_flatten()
            .map_err(StorageError::Transport)
            .boxed();

        Ok(BlobDownload {
            content_type,
            content_length: None,
            stream,
        })
    }

    async fn delete(&self, blob_name: &str) -> Result<bool> {
        let result = self
            .blob(blob_name)
            .delete()
            .delete_snapshots_method(DeleteSnapshotsMethod::Include)
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(e) => match service_error(e, || format!("blob '{}'", blob_name)) {
                StorageError::NotFound { .. } => Ok(false),
                other => Err(other),
            },
        }
    }

    async fn create_directory(&self, directory_name: &str) -> Result<String> {
        let placeholder = names::directory_placeholder(directory_name)
            .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;
        self.ensure_container().await?;
        self.put_block_blob(&placeholder, Bytes::new(), None).await
    }

    async fn create_container(&self, container_name: &str) -> Result<bool> {
        let result = self
            .container(container_name)
            .create()
            .public_access(container_access(self.options.public_access))
            .await;
        match result {
            Ok(_) => {
                info!(container = ?container_name, "Created container");
                Ok(true)
            }
            Err(e) => match service_error(e, || format!("container '{}'", container_name)) {
                StorageError::Remote { code, .. } if code == "ContainerAlreadyExists" => {
                    debug!(container = ?container_name, "Container already exists");
                    Ok(false)
                }
                other => Err(other),
            },
        }
    }

    fn list_blobs<'a>(&'a self, container_name: &'a str) -> BoxStream<'a, Result<BlobItem>> {
        // The pager follows NextMarker until the last page
        self.container(container_name)
            .list_blobs()
            .into_stream()
            .map_err(move |e| service_error(e, || format!("container '{}'", container_name)))
            .map_ok(|page| {
                let items: Vec<_> = page.blobs.blobs().map(blob_item).map(Ok).collect();
                stream::iter(items)
            })
            .try_flatten()
            .boxed()
    }

    async fn container_properties(&self, container_name: &str) -> Result<ContainerProperties> {
        let response = self
            .container(container_name)
            .get_properties()
            .await
            .map_err(|e| service_error(e, || format!("container '{}'", container_name)))?;
        let container = response.container;

        Ok(ContainerProperties {
            last_modified: Some(azure_core::date::to_rfc1123(&container.last_modified)),
            etag: Some(container.e_tag.clone()),
            lease_status: Some(wire_name(&container.lease_status)),
            lease_state: Some(wire_name(&container.lease_state)),
            lease_duration: container.lease_duration.as_ref().map(wire_name),
            public_access: match container.public_access {
                ContainerAccess::None => None,
                access => Some(wire_name(&access)),
            },
            has_immutability_policy: container.has_immutability_policy,
            has_legal_hold: container.has_legal_hold,
            metadata: container.metadata.into_iter().collect(),
        })
    }

    async fn get_metadata(&self, blob_name: &str) -> Result<BlobMetadata> {
        let blob = self
            .find_blob(blob_name, false)
            .await?
            .into_iter()
            .find(|b| b.snapshot.is_none())
            .ok_or_else(|| StorageError::NotFound {
                resource: format!("blob '{}'", blob_name),
            })?;
        Ok(blob.metadata.unwrap_or_default().into_iter().collect())
    }

    async fn set_metadata(&self, blob_name: &str, metadata: &BlobMetadata) -> Result<()> {
        names::validate_metadata(metadata)
            .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;

        // Metadata travels as `x-ms-meta-*` headers and header names are lowercase
        let mut values = Metadata::new();
        for (key, value) in metadata {
            values.insert(key.to_ascii_lowercase(), value.clone());
        }

        self.blob(blob_name)
            .set_metadata()
            .metadata(values)
            .await
            .map_err(|e| service_error(e, || format!("blob '{}'", blob_name)))?;
        debug!(blob = ?blob_name, keys = metadata.len(), "Set blob metadata");
        Ok(())
    }

    async fn copy_blob(
        &self,
        source_blob_name: &str,
        destination_blob_name: &str,
    ) -> Result<String> {
        let source_url = self.blob(source_blob_name).url()?;
        let destination = self.blob(destination_blob_name);
        destination
            .copy(source_url)
            .await
            .map_err(|e| service_error(e, || format!("blob '{}'", source_blob_name)))?;
        info!(
            source = ?source_blob_name,
            destination = ?destination_blob_name,
            "Started blob copy"
        );
        Ok(destination.url()?.to_string())
    }

    async fn create_snapshot(&self, blob_name: &str) -> Result<String> {
        self.blob(blob_name)
            .snapshot()
            .await
            .map_err(|e| service_error(e, || format!("blob '{}'", blob_name)))?;

        // The token is the newest snapshot timestamp of the blob
        self.find_blob(blob_name, true)
            .await?
            .into_iter()
            .filter_map(|b| b.snapshot)
            .max()
            .map(|taken| azure_core::date::to_rfc3339(&taken))
            .ok_or_else(|| StorageError::NotFound {
                resource: format!("snapshot of blob '{}'", blob_name),
            })
    }
}

/// Map an SDK error: 404 becomes `NotFound`, other HTTP failures keep the
/// service error code
fn service_error(error: azure_core::Error, resource: impl FnOnce() -> String) -> StorageError {
    let http = match error.kind() {
        ErrorKind::HttpResponse { status, error_code } => Some((*status as u16, error_code.clone())),
        _ => None,
    };
    let Some((status, error_code)) = http else {
        return StorageError::Transport(error);
    };

    let code = error_code.unwrap_or_else(|| status.to_string());
    debug!(status, code = %code, "Blob service error");
    if status == 404 {
        StorageError::NotFound {
            resource: resource(),
        }
    } else {
        let message = error.to_string();
        StorageError::Remote {
            status,
            code,
            message: message.lines().next().unwrap_or_default().to_string(),
        }
    }
}

fn container_access(access: PublicAccess) -> ContainerAccess {
    match access {
        PublicAccess::Private => ContainerAccess::None,
        PublicAccess::Blob => ContainerAccess::Blob,
        PublicAccess::Container => ContainerAccess::Container,
    }
}

/// Service spelling of a single-word SDK enum such as `LeaseState::Available`
fn wire_name<T: fmt::Debug>(value: &T) -> String {
    format!("{:?}", value).to_ascii_lowercase()
}

fn blob_item(blob: &Blob) -> BlobItem {
    let properties = &blob.properties;
    BlobItem {
        name: blob.name.clone(),
        content_length: properties.content_length,
        content_type: Some(properties.content_type.clone()).filter(|t| !t.is_empty()),
        last_modified: Some(azure_core::date::to_rfc1123(&properties.last_modified)),
        etag: Some(properties.etag.to_string()),
        blob_type: Some(format!("{:?}", properties.blob_type)),
    }
}

/// Resolve the endpoint and Shared Key credentials from a storage connection string
fn parse_connection_string(raw: &str) -> Result<(Endpoint, StorageCredentials)> {
    let invalid = |e: ConnectionStringError| StorageError::InvalidConfig(e.to_string());
    let parsed = ConnectionString::parse(raw).map_err(invalid)?;

    let development = parsed
        .get("UseDevelopmentStorage")
        .map_or(false, |v| v.eq_ignore_ascii_case("true"));
    if development {
        let endpoint = Endpoint {
            account: DEVELOPMENT_ACCOUNT.to_string(),
            uri: DEVELOPMENT_ENDPOINT.to_string(),
        };
        let credentials = StorageCredentials::access_key(DEVELOPMENT_ACCOUNT, DEVELOPMENT_KEY.to_string());
        return Ok((endpoint, credentials));
    }

    let account = parsed.require("AccountName").map_err(invalid)?;
    let key = parsed.require("AccountKey").map_err(invalid)?;

    let uri = match parsed.get("BlobEndpoint").filter(|e| !e.is_empty()) {
        Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
        None => {
            let protocol = parsed
                .get("DefaultEndpointsProtocol")
                .filter(|p| !p.is_empty())
                .unwrap_or("https");
            let suffix = parsed
                .get("EndpointSuffix")
                .filter(|s| !s.is_empty())
                .unwrap_or("core.windows.net");
            format!("{}://{}.blob.{}", protocol, account, suffix)
        }
    };

    let endpoint = Endpoint {
        account: account.to_string(),
        uri,
    };
    let credentials = StorageCredentials::access_key(account.to_string(), key.to_string());
    Ok((endpoint, credentials))
}
