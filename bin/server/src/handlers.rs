//! HTTP request handlers

pub mod blob;
pub mod cosmos;
pub mod error;
pub mod health;
pub mod upload_form;

#[cfg(test)]
mod testing;

use actix_web::web;
use error::invalid_input;

/// Register every route plus the extractor configs that turn malformed
/// requests into the error envelope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(upload_form::config())
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            invalid_input(format!("Invalid JSON body: {}", err)).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            invalid_input(format!("Invalid query string: {}", err)).into()
        }))
        .service(health::health)
        .service(blob::upload)
        // Container routes take precedence over the tail-matched blob name
        .service(blob::list_files)
        .service(blob::container_properties)
        .service(blob::download)
        .service(blob::delete_blob)
        .service(blob::create_directory)
        .service(blob::create_container)
        .service(blob::get_metadata)
        .service(blob::set_metadata)
        .service(blob::copy_blob)
        .service(blob::create_snapshot)
        .service(cosmos::create_database)
        .service(cosmos::delete_database)
        .service(cosmos::create_container)
        .service(cosmos::create_document)
        .service(cosmos::read_item)
        .service(cosmos::create_stored_procedure)
        .service(cosmos::execute_stored_procedure);
}
