//! Document database endpoints

use crate::handlers::error::{document_error, invalid_input, ApiError};
use crate::state::AppState;
use actix_web::{delete, get, post, web, HttpResponse};
use common::{names, StoredProcedureRequest};
use document_store::scripts::BULK_INSERT_PROCEDURE;
use document_store::DEFAULT_PARTITION_KEY_PATH;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

type HandlerResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseQuery {
    pub database_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerQuery {
    pub database_name: String,
    pub container_name: String,
    pub partition_key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    pub database_name: String,
    pub container: String,
    /// Defaults to the item's `id`
    pub partition_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadItemQuery {
    pub database_name: String,
    pub container: String,
    pub id: String,
    /// Defaults to `id`
    pub partition_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureQuery {
    pub database_name: String,
    pub container_name: String,
    pub procedure_name: String,
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, ApiError> {
    if names::is_blank(value) {
        return Err(invalid_input(format!("The {} field is required.", field)));
    }
    Ok(value)
}

#[post("/cosmosdb/createDatabase")]
pub async fn create_database(
    query: web::Query<DatabaseQuery>,
    state: web::Data<AppState>,
) -> HandlerResult {
    let database = required("databaseName", &query.database_name)?;
    info!(database = ?database, "POST /cosmosdb/createDatabase - Request received");

    let resource = state
        .documents
        .create_database(database)
        .await
        .map_err(|e| document_error("Failed to create database", e))?;
    Ok(HttpResponse::Ok().json(resource))
}

#[delete("/cosmosdb/deleteDatabase")]
pub async fn delete_database(
    query: web::Query<DatabaseQuery>,
    state: web::Data<AppState>,
) -> HandlerResult {
    let database = required("databaseName", &query.database_name)?;
    info!(database = ?database, "DELETE /cosmosdb/deleteDatabase - Request received");

    state
        .documents
        .delete_database(database)
        .await
        .map_err(|e| document_error("Failed to delete database", e))?;
    Ok(HttpResponse::Ok().finish())
}

#[post("/cosmosdb/createContainer")]
pub async fn create_container(
    query: web::Query<ContainerQuery>,
    state: web::Data<AppState>,
) -> HandlerResult {
    let database = required("databaseName", &query.database_name)?;
    let container = required("containerName", &query.container_name)?;
    let partition_key_path = query
        .partition_key_path
        .as_deref()
        .filter(|p| !names::is_blank(p))
        .unwrap_or(DEFAULT_PARTITION_KEY_PATH);
    info!(
        database = ?database,
        container = ?container,
        partition_key_path = ?partition_key_path,
        "POST /cosmosdb/createContainer - Request received"
    );

    let resource = state
        .documents
        .create_container(database, container, partition_key_path)
        .await
        .map_err(|e| document_error("Failed to create container", e))?;
    Ok(HttpResponse::Ok().json(resource))
}

#[post("/cosmosdb/createDocument")]
pub async fn create_document(
    query: web::Query<DocumentQuery>,
    item: web::Json<Value>,
    state: web::Data<AppState>,
) -> HandlerResult {
    let database = required("databaseName", &query.database_name)?;
    let container = required("container", &query.container)?;
    let item = item.into_inner();
    let id = item
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !names::is_blank(id))
        .ok_or_else(|| invalid_input("The document must be a JSON object with a string 'id'."))?;
    let partition_key = query
        .partition_key
        .as_deref()
        .filter(|p| !names::is_blank(p))
        .unwrap_or(id);
    info!(
        database = ?database,
        container = ?container,
        id = ?id,
        "POST /cosmosdb/createDocument - Request received"
    );

    let created = state
        .documents
        .create_item(database, container, partition_key, &item)
        .await
        .map_err(|e| document_error("Failed to create document", e))?;
    Ok(HttpResponse::Ok().json(created))
}

/// A missing item answers `null` with 200
#[get("/cosmosdb/readItem")]
pub async fn read_item(
    query: web::Query<ReadItemQuery>,
    state: web::Data<AppState>,
) -> HandlerResult {
    let database = required("databaseName", &query.database_name)?;
    let container = required("container", &query.container)?;
    let id = required("id", &query.id)?;
    let partition_key = query
        .partition_key
        .as_deref()
        .filter(|p| !names::is_blank(p))
        .unwrap_or(id);
    info!(
        database = ?database,
        container = ?container,
        id = ?id,
        "GET /cosmosdb/readItem - Request received"
    );

    let item = state
        .documents
        .read_item(database, container, id, partition_key)
        .await
        .map_err(|e| document_error("Failed to read item", e))?;
    Ok(HttpResponse::Ok().json(item))
}

/// Register a stored procedure. An empty body registers the built-in bulk insert script.
#[post("/cosmosdb/createStoredProcedure")]
pub async fn create_stored_procedure(
    query: web::Query<ProcedureQuery>,
    body: web::Bytes,
    state: web::Data<AppState>,
) -> HandlerResult {
    let database = required("databaseName", &query.database_name)?;
    let container = required("containerName", &query.container_name)?;
    let procedure = required("procedureName", &query.procedure_name)?;
    let script = std::str::from_utf8(&body)
        .map_err(|_| invalid_input("Stored procedure body must be UTF-8 text."))?;
    let script = if names::is_blank(script) {
        BULK_INSERT_PROCEDURE
    } else {
        script
    };
    info!(
        database = ?database,
        container = ?container,
        procedure = ?procedure,
        "POST /cosmosdb/createStoredProcedure - Request received"
    );

    let resource = state
        .documents
        .create_stored_procedure(database, container, procedure, script)
        .await
        .map_err(|e| document_error("Failed to create stored procedure", e))?;
    Ok(HttpResponse::Ok().json(resource))
}

#[post("/cosmosdb/executeStoredProcedure")]
pub async fn execute_stored_procedure(
    request: web::Json<StoredProcedureRequest>,
    state: web::Data<AppState>,
) -> HandlerResult {
    let request = request.into_inner();
    request.validate().map_err(invalid_input)?;
    info!(
        database = ?request.database_name,
        container = ?request.container_name,
        procedure = ?request.procedure_name,
        items = request.items.len(),
        "POST /cosmosdb/executeStoredProcedure - Request received"
    );

    let result = state
        .documents
        .execute_stored_procedure(
            &request.database_name,
            &request.container_name,
            &request.procedure_name,
            &request.partition_name,
            &request.items,
        )
        .await
        .map_err(|e| document_error("Failed to execute stored procedure", e))?;

    info!(procedure = ?request.procedure_name, "Stored procedure executed");
    Ok(HttpResponse::Ok().json(result))
}
