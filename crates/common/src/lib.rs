pub mod connection_string;
pub mod names;
#[cfg(feature = "stub-server")]
pub mod stub_server;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// User-defined blob metadata (name -> value)
pub type BlobMetadata = BTreeMap<String, String>;

/// Uniform response envelope used for metadata, copy, snapshot and every error body
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServiceResponse<T> {
    pub data: Option<T>,
    pub success: bool,
    pub message: String,
}

impl<T> ServiceResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            data: Some(data),
            success: true,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let mut response = Self::default();
        response.set_error(message);
        response
    }

    /// Clear the payload and mark the response as failed
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.data = None;
        self.success = false;
        self.message = message.into();
    }
}

impl<T> Default for ServiceResponse<T> {
    fn default() -> Self {
        Self {
            data: None,
            success: true,
            message: String::new(),
        }
    }
}

/// Response to a successful blob upload
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub file_url: String,
}

/// One entry of a container listing
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlobItem {
    pub name: String,
    pub content_length: u64,
    pub content_type: Option<String>,
    pub last_modified: Option<String>,
    pub etag: Option<String>,
    pub blob_type: Option<String>,
}

/// Response listing every blob in a container
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct FileListResponse {
    pub files: Vec<BlobItem>,
}

/// Container properties as reported by the blob service
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerProperties {
    pub last_modified: Option<String>,
    pub etag: Option<String>,
    pub lease_status: Option<String>,
    pub lease_state: Option<String>,
    pub lease_duration: Option<String>,
    /// `None` when the container is private
    pub public_access: Option<String>,
    pub has_immutability_policy: bool,
    pub has_legal_hold: bool,
    pub metadata: BlobMetadata,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ContainerPropertiesResponse {
    pub properties: ContainerProperties,
}

/// Request body for `POST /cosmosdb/executeStoredProcedure`
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoredProcedureRequest {
    pub database_name: String,
    pub container_name: String,
    pub procedure_name: String,
    /// Partition key value the procedure runs under
    pub partition_name: String,
    /// Passed to the procedure as its single argument
    #[serde(default)]
    pub items: Vec<serde_json::Value>,
}

impl StoredProcedureRequest {
    /// Check that every required field is present
    pub fn validate(&self) -> Result<(), String> {
        let required = [
            ("databaseName", &self.database_name),
            ("containerName", &self.container_name),
            ("procedureName", &self.procedure_name),
            ("partitionName", &self.partition_name),
        ];
        for (field, value) in required {
            if names::is_blank(value) {
                return Err(format!("The {} field is required.", field));
            }
        }
        Ok(())
    }
}

/// Response from health check endpoint
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String, // "ok" when healthy
}
