//! Blob endpoints

use crate::constants::DOWNLOAD_CONTENT_TYPE;
use crate::handlers::error::{invalid_input, not_found, server_error, storage_error, ApiError};
use crate::handlers::upload_form::UploadForm;
use crate::state::AppState;
use actix_multipart::form::MultipartForm;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{delete, get, post, web, HttpResponse};
use common::names;
use common::{
    BlobItem, BlobMetadata, ContainerPropertiesResponse, FileListResponse, ServiceResponse,
    UploadResponse,
};
use futures::TryStreamExt;
use serde::Deserialize;
use tracing::info;

type HandlerResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyQuery {
    pub source_blob_name: String,
    pub destination_blob_name: String,
}

/// Handle file upload (multipart/form-data)
#[post("/blob/upload")]
pub async fn upload(form: MultipartForm<UploadForm>, state: web::Data<AppState>) -> HandlerResult {
    let blob_name = form.blob_name().map_err(invalid_input)?;
    let content_type = form.content_type();
    let UploadForm { file } = form.into_inner();

    info!(blob = ?blob_name, size = file.size, "POST /blob/upload - Request received");

    // File size is already limited by the multipart config
    let content = tokio::fs::read(file.file.path())
        .await
        .map_err(|e| server_error("Failed to read uploaded file", e))?;

    let file_url = state
        .blobs
        .upload(&blob_name, web::Bytes::from(content), content_type.as_deref())
        .await
        .map_err(|e| storage_error("Failed to upload blob", e))?;

    info!(blob = ?blob_name, "POST /blob/upload - Blob uploaded");
    Ok(HttpResponse::Ok().json(UploadResponse { file_url }))
}

/// List every blob in a container
#[get("/blob/get/{container}/files")]
pub async fn list_files(path: web::Path<String>, state: web::Data<AppState>) -> HandlerResult {
    let container = path.into_inner();
    info!(container = ?container, "GET /blob/get/{{container}}/files - Request received");
    names::validate_container_name(&container).map_err(|e| invalid_input(e.message()))?;

    let files: Vec<BlobItem> = state
        .blobs
        .list_blobs(&container)
        .try_collect()
        .await
        .map_err(|e| storage_error("Failed to list blobs", e))?;

    info!(container = ?container, count = files.len(), "Listed container");
    Ok(HttpResponse::Ok().json(FileListResponse { files }))
}

#[get("/blob/get/{container}/properties")]
pub async fn container_properties(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> HandlerResult {
    let container = path.into_inner();
    info!(container = ?container, "GET /blob/get/{{container}}/properties - Request received");
    names::validate_container_name(&container).map_err(|e| invalid_input(e.message()))?;

    let properties = state
        .blobs
        .container_properties(&container)
        .await
        .map_err(|e| storage_error("Failed to get container properties", e))?;

    Ok(HttpResponse::Ok().json(ContainerPropertiesResponse { properties }))
}

/// Stream a blob back to the caller
#[get("/blob/get/{name:.*}")]
pub async fn download(path: web::Path<String>, state: web::Data<AppState>) -> HandlerResult {
    let blob_name = path.into_inner();
    info!(blob = ?blob_name, "GET /blob/get - Request received");
    names::validate_blob_name(&blob_name).map_err(|e| invalid_input(e.message()))?;

    let download = state
        .blobs
        .download(&blob_name)
        .await
        .map_err(|e| storage_error("Failed to download blob", e))?;

    let file_name = blob_name.rsplit('/').next().unwrap_or(&blob_name).to_string();
    let mut response = HttpResponse::Ok();
    response
        .content_type(DOWNLOAD_CONTENT_TYPE)
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(file_name)],
        });
    if let Some(length) = download.content_length {
        response.no_chunking(length);
    }
    Ok(response.streaming(download.stream))
}

#[delete("/blob/delete/{name:.*}")]
pub async fn delete_blob(path: web::Path<String>, state: web::Data<AppState>) -> HandlerResult {
    let blob_name = path.into_inner();
    info!(blob = ?blob_name, "DELETE /blob/delete - Request received");
    names::validate_blob_name(&blob_name).map_err(|e| invalid_input(e.message()))?;

    let deleted = state
        .blobs
        .delete(&blob_name)
        .await
        .map_err(|e| storage_error("Failed to delete blob", e))?;

    if !deleted {
        return Err(not_found(format!("Blob '{}' not found.", blob_name)));
    }
    info!(blob = ?blob_name, "DELETE /blob/delete - Blob deleted");
    Ok(HttpResponse::Ok().finish())
}

#[post("/blob/create-directory")]
pub async fn create_directory(body: web::Bytes, state: web::Data<AppState>) -> HandlerResult {
    let directory_name = name_from_body(&body);
    info!(directory = ?directory_name, "POST /blob/create-directory - Request received");
    if names::is_blank(&directory_name) {
        return Err(invalid_input("Directory name cannot be empty."));
    }
    names::directory_placeholder(&directory_name).map_err(|e| invalid_input(e.message()))?;

    state
        .blobs
        .create_directory(&directory_name)
        .await
        .map_err(|e| storage_error("Failed to create directory", e))?;

    Ok(HttpResponse::Ok().json(format!(
        "Directory '{}' created successfully.",
        directory_name
    )))
}

#[post("/blob/create-container")]
pub async fn create_container(body: web::Bytes, state: web::Data<AppState>) -> HandlerResult {
    let container_name = name_from_body(&body);
    info!(container = ?container_name, "POST /blob/create-container - Request received");
    if names::is_blank(&container_name) {
        return Err(invalid_input("Container name cannot be empty."));
    }
    names::validate_container_name(&container_name).map_err(|e| invalid_input(e.message()))?;

    let created = state
        .blobs
        .create_container(&container_name)
        .await
        .map_err(|e| storage_error("Failed to create container", e))?;

    let message = if created {
        format!("Container '{}' created successfully.", container_name)
    } else {
        format!("Container '{}' already exists.", container_name)
    };
    Ok(HttpResponse::Ok().json(message))
}

#[get("/blob/metadata/{name:.*}")]
pub async fn get_metadata(path: web::Path<String>, state: web::Data<AppState>) -> HandlerResult {
    let blob_name = path.into_inner();
    info!(blob = ?blob_name, "GET /blob/metadata - Request received");
    names::validate_blob_name(&blob_name).map_err(|e| invalid_input(e.message()))?;

    let metadata = state
        .blobs
        .get_metadata(&blob_name)
        .await
        .map_err(|e| server_error("Error retrieving metadata", e))?;

    Ok(HttpResponse::Ok().json(ServiceResponse::ok(
        metadata,
        "Metadata retrieved successfully.",
    )))
}

#[post("/blob/metadata/{name:.*}")]
pub async fn set_metadata(
    path: web::Path<String>,
    metadata: web::Json<BlobMetadata>,
    state: web::Data<AppState>,
) -> HandlerResult {
    let blob_name = path.into_inner();
    let metadata = metadata.into_inner();
    info!(blob = ?blob_name, keys = metadata.len(), "POST /blob/metadata - Request received");
    names::validate_blob_name(&blob_name).map_err(|e| invalid_input(e.message()))?;
    names::validate_metadata(&metadata).map_err(|e| invalid_input(e.message()))?;

    state
        .blobs
        .set_metadata(&blob_name, &metadata)
        .await
        .map_err(|e| server_error("Error setting metadata", e))?;

    Ok(HttpResponse::Ok().json(ServiceResponse::ok(blob_name, "Metadata set successfully.")))
}

/// Start a server-side copy; completion is not awaited
#[post("/blob/copy")]
pub async fn copy_blob(query: web::Query<CopyQuery>, state: web::Data<AppState>) -> HandlerResult {
    let CopyQuery {
        source_blob_name,
        destination_blob_name,
    } = query.into_inner();
    info!(
        source = ?source_blob_name,
        destination = ?destination_blob_name,
        "POST /blob/copy - Request received"
    );
    names::validate_blob_name(&source_blob_name).map_err(|e| invalid_input(e.message()))?;
    names::validate_blob_name(&destination_blob_name).map_err(|e| invalid_input(e.message()))?;

    let destination_url = state
        .blobs
        .copy_blob(&source_blob_name, &destination_blob_name)
        .await
        .map_err(|e| server_error("Error copying blob", e))?;

    Ok(HttpResponse::Ok().json(ServiceResponse::ok(
        destination_url,
        "Blob copied successfully.",
    )))
}

#[post("/blob/snapshot/{name:.*}")]
pub async fn create_snapshot(path: web::Path<String>, state: web::Data<AppState>) -> HandlerResult {
    let blob_name = path.into_inner();
    info!(blob = ?blob_name, "POST /blob/snapshot - Request received");
    names::validate_blob_name(&blob_name).map_err(|e| invalid_input(e.message()))?;

    let snapshot = state
        .blobs
        .create_snapshot(&blob_name)
        .await
        .map_err(|e| server_error("Error creating snapshot", e))?;

    Ok(HttpResponse::Ok().json(ServiceResponse::ok(snapshot, "Snapshot created successfully.")))
}

/// Names arrive either as a JSON string or as plain text
fn name_from_body(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    serde_json::from_str::<String>(&text).unwrap_or_else(|_| text.trim().to_string())
}
