//! In-memory stores for router tests

use crate::state::AppState;
use actix_web::http::header;
use actix_web::{test, web};
use async_trait::async_trait;
use blob_store::{BlobDownload, BlobItem, BlobMetadata, BlobStore, ContainerProperties, StorageError};
use document_store::{DocumentError, DocumentStore};
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const DEFAULT_CONTAINER: &str = "uploads";
const ENDPOINT: &str = "http://blobs.test";

#[derive(Clone)]
struct StoredBlob {
    content: web::Bytes,
    content_type: Option<String>,
    metadata: BlobMetadata,
}

/// Blob store keeping everything in maps; blob calls target the default container
pub struct MemoryBlobStore {
    containers: Mutex<BTreeMap<String, BTreeMap<String, StoredBlob>>>,
    snapshots: AtomicUsize,
}

impl MemoryBlobStore {
    fn new() -> Self {
        let mut containers = BTreeMap::new();
        containers.insert(DEFAULT_CONTAINER.to_string(), BTreeMap::new());
        Self {
            containers: Mutex::new(containers),
            snapshots: AtomicUsize::new(0),
        }
    }

    fn url(blob_name: &str) -> String {
        format!("{}/{}/{}", ENDPOINT, DEFAULT_CONTAINER, blob_name)
    }

    fn with_default<T>(&self, f: impl FnOnce(&mut BTreeMap<String, StoredBlob>) -> T) -> T {
        let mut containers = self.containers.lock().unwrap();
        f(containers.get_mut(DEFAULT_CONTAINER).unwrap())
    }

    fn get(&self, blob_name: &str) -> Result<StoredBlob, StorageError> {
        self.with_default(|blobs| blobs.get(blob_name).cloned())
            .ok_or_else(|| StorageError::NotFound {
                resource: format!("blob '{}'", blob_name),
            })
    }

    pub fn contains(&self, blob_name: &str) -> bool {
        self.with_default(|blobs| blobs.contains_key(blob_name))
    }

    pub fn blob_count(&self) -> usize {
        self.containers.lock().unwrap().values().map(BTreeMap::len).sum()
    }

    pub fn container_count(&self) -> usize {
        self.containers.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        blob_name: &str,
        content: web::Bytes,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        self.with_default(|blobs| {
            blobs.insert(
                blob_name.to_string(),
                StoredBlob {
                    content,
                    content_type: content_type.map(str::to_string),
                    metadata: BlobMetadata::new(),
                },
            )
        });
        Ok(Self::url(blob_name))
    }

    async fn download(&self, blob_name: &str) -> Result<BlobDownload, StorageError> {
        let blob = self.get(blob_name)?;
        Ok(BlobDownload {
            content_type: blob.content_type,
            content_length: Some(blob.content.len() as u64),
            stream: stream::iter(vec![Ok(blob.content)]).boxed(),
        })
    }

    async fn delete(&self, blob_name: &str) -> Result<bool, StorageError> {
        Ok(self.with_default(|blobs| blobs.remove(blob_name)).is_some())
    }

    async fn create_directory(&self, directory_name: &str) -> Result<String, StorageError> {
        let placeholder = common::names::directory_placeholder(directory_name)
            .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;
        self.upload(&placeholder, web::Bytes::new(), None).await
    }

    async fn create_container(&self, container_name: &str) -> Result<bool, StorageError> {
        let mut containers = self.containers.lock().unwrap();
        if containers.contains_key(container_name) {
            return Ok(false);
        }
        containers.insert(container_name.to_string(), BTreeMap::new());
        Ok(true)
    }

    fn list_blobs<'a>(
        &'a self,
        container_name: &'a str,
    ) -> BoxStream<'a, Result<BlobItem, StorageError>> {
        let containers = self.containers.lock().unwrap();
        let items: Vec<Result<BlobItem, StorageError>> = match containers.get(container_name) {
            Some(blobs) => blobs
                .iter()
                .map(|(name, blob)| {
                    Ok(BlobItem {
                        name: name.clone(),
                        content_length: blob.content.len() as u64,
                        content_type: blob.content_type.clone(),
                        blob_type: Some("BlockBlob".to_string()),
                        ..Default::default()
                    })
                })
                .collect(),
            None => vec![Err(StorageError::NotFound {
                resource: format!("container '{}'", container_name),
            })],
        };
        stream::iter(items).boxed()
    }

    async fn container_properties(
        &self,
        container_name: &str,
    ) -> Result<ContainerProperties, StorageError> {
        if !self.containers.lock().unwrap().contains_key(container_name) {
            return Err(StorageError::NotFound {
                resource: format!("container '{}'", container_name),
            });
        }
        Ok(ContainerProperties {
            lease_status: Some("unlocked".to_string()),
            lease_state: Some("available".to_string()),
            public_access: Some("blob".to_string()),
            ..Default::default()
        })
    }

    async fn get_metadata(&self, blob_name: &str) -> Result<BlobMetadata, StorageError> {
        Ok(self.get(blob_name)?.metadata)
    }

    async fn set_metadata(
        &self,
        blob_name: &str,
        metadata: &BlobMetadata,
    ) -> Result<(), StorageError> {
        self.get(blob_name)?;
        self.with_default(|blobs| {
            if let Some(blob) = blobs.get_mut(blob_name) {
                blob.metadata = metadata.clone();
            }
        });
        Ok(())
    }

    async fn copy_blob(
        &self,
        source_blob_name: &str,
        destination_blob_name: &str,
    ) -> Result<String, StorageError> {
        let source = self.get(source_blob_name)?;
        self.with_default(|blobs| blobs.insert(destination_blob_name.to_string(), source));
        Ok(Self::url(destination_blob_name))
    }

    async fn create_snapshot(&self, blob_name: &str) -> Result<String, StorageError> {
        self.get(blob_name)?;
        let n = self.snapshots.fetch_add(1, Ordering::SeqCst);
        Ok(format!("2024-01-01T00:00:00.{:07}Z", n))
    }
}

/// Document store keeping databases, items and procedure bodies in maps
#[derive(Default)]
pub struct MemoryDocumentStore {
    databases: Mutex<BTreeSet<String>>,
    items: Mutex<BTreeMap<(String, String, String), (String, Value)>>,
    procedures: Mutex<BTreeMap<String, String>>,
}

impl MemoryDocumentStore {
    /// Partition keys of every stored item
    pub fn partition_keys(&self) -> Vec<String> {
        self.items
            .lock()
            .unwrap()
            .values()
            .map(|(pk, _)| pk.clone())
            .collect()
    }

    pub fn procedure_body(&self, name: &str) -> Option<String> {
        self.procedures.lock().unwrap().get(name).cloned()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create_database(&self, database: &str) -> Result<Value, DocumentError> {
        self.databases.lock().unwrap().insert(database.to_string());
        Ok(json!({ "id": database }))
    }

    async fn delete_database(&self, database: &str) -> Result<(), DocumentError> {
        if self.databases.lock().unwrap().remove(database) {
            Ok(())
        } else {
            Err(DocumentError::NotFound {
                resource: format!("database '{}'", database),
            })
        }
    }

    async fn create_container(
        &self,
        _database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> Result<Value, DocumentError> {
        Ok(json!({
            "id": container,
            "partitionKey": { "paths": [partition_key_path], "kind": "Hash", "version": 2 }
        }))
    }

    async fn create_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        item: &Value,
    ) -> Result<Value, DocumentError> {
        let id = item["id"].as_str().unwrap_or_default().to_string();
        self.items.lock().unwrap().insert(
            (database.to_string(), container.to_string(), id),
            (partition_key.to_string(), item.clone()),
        );
        Ok(item.clone())
    }

    async fn read_item(
        &self,
        database: &str,
        container: &str,
        id: &str,
        _partition_key: &str,
    ) -> Result<Option<Value>, DocumentError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .get(&(database.to_string(), container.to_string(), id.to_string()))
            .map(|(_, item)| item.clone()))
    }

    async fn create_stored_procedure(
        &self,
        _database: &str,
        _container: &str,
        procedure: &str,
        body: &str,
    ) -> Result<Value, DocumentError> {
        self.procedures
            .lock()
            .unwrap()
            .insert(procedure.to_string(), body.to_string());
        Ok(json!({ "id": procedure, "body": body }))
    }

    async fn execute_stored_procedure(
        &self,
        _database: &str,
        _container: &str,
        procedure: &str,
        partition_key: &str,
        items: &[Value],
    ) -> Result<Value, DocumentError> {
        if !self.procedures.lock().unwrap().contains_key(procedure) {
            return Err(DocumentError::NotFound {
                resource: format!("stored procedure '{}'", procedure),
            });
        }
        Ok(json!({ "inserted": items.len(), "partitionKey": partition_key }))
    }
}

/// App state backed by fresh in-memory stores, plus handles to inspect them
pub fn test_state() -> (
    web::Data<AppState>,
    Arc<MemoryBlobStore>,
    Arc<MemoryDocumentStore>,
) {
    let blobs = Arc::new(MemoryBlobStore::new());
    let documents = Arc::new(MemoryDocumentStore::default());
    let state = web::Data::new(AppState::new(blobs.clone(), documents.clone()));
    (state, blobs, documents)
}

/// Multipart upload request with a single `file` part
pub fn multipart_upload(file_name: &str, content: &[u8]) -> test::TestRequest {
    let boundary = "----gateway-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: text/plain\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    test::TestRequest::post()
        .uri("/blob/upload")
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(body)
}
