//! Document Client Adapter: database and container provisioning, item
//! create/read, stored procedure registration and execution.

pub mod auth;
pub mod cosmos;
pub mod error;
pub mod scripts;

use async_trait::async_trait;
use serde_json::Value;

pub use cosmos::CosmosDocumentStore;
pub use error::{DocumentError, Result};

/// Partition key path given to containers when the caller names none
pub const DEFAULT_PARTITION_KEY_PATH: &str = "/id";

/// Document store operations. Returned values are the remote resource bodies.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create the database, or return the existing one
    async fn create_database(&self, database: &str) -> Result<Value>;

    async fn delete_database(&self, database: &str) -> Result<()>;

    /// Create the container, or return the existing one
    async fn create_container(
        &self,
        database: &str,
        container: &str,
        partition_key_path: &str,
    ) -> Result<Value>;

    async fn create_item(
        &self,
        database: &str,
        container: &str,
        partition_key: &str,
        item: &Value,
    ) -> Result<Value>;

    /// Read one item. A missing item is `Ok(None)`, not an error.
    async fn read_item(
        &self,
        database: &str,
        container: &str,
        id: &str,
        partition_key: &str,
    ) -> Result<Option<Value>>;

    async fn create_stored_procedure(
        &self,
        database: &str,
        container: &str,
        procedure: &str,
        body: &str,
    ) -> Result<Value>;

    /// Run a stored procedure with `items` as its single argument
    async fn execute_stored_procedure(
        &self,
        database: &str,
        container: &str,
        procedure: &str,
        partition_key: &str,
        items: &[Value],
    ) -> Result<Value>;
}
