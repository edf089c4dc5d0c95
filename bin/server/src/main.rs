mod config;
mod constants;
mod handlers;
mod state;

use actix_web::{web, App, HttpServer};
use anyhow::Context;
use config::ServerConfig;
use document_store::CosmosDocumentStore;
use state::AppState;
use std::sync::Arc;
use tracing::{error, info};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter
    // Filter out actix-server worker shutdown messages
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info")
                    .add_directive("actix_server::worker=warn".parse().unwrap())
                    .add_directive("actix_server::accept=warn".parse().unwrap())
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting storage gateway (PID: {})", std::process::id());

    let config = ServerConfig::load().context("Failed to load configuration")?;

    let blobs = config
        .blob_backend()
        .initialize(config.blob_options.clone())
        .await
        .map_err(|e| {
            error!("Failed to initialize blob store: {}", e);
            e
        })
        .context("Failed to initialize blob store")?;

    let documents = CosmosDocumentStore::from_connection_string(
        &config.cosmos_connection_string,
        config.cosmos_accept_invalid_certs,
    )
    .map_err(|e| {
        error!("Failed to initialize document store: {}", e);
        e
    })
    .context("Failed to initialize document store")?;

    let state = web::Data::new(AppState::new(blobs, Arc::new(documents)));

    let bind_address = config.bind_address();
    info!("Starting server on http://{}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(&bind_address)
    .map_err(|e| {
        error!("Failed to bind to {}: {}", bind_address, e);
        e
    })
    .with_context(|| format!("Failed to bind to {}", bind_address))?;

    info!("Server bound successfully to http://{}", bind_address);

    // Runs until the server receives a shutdown signal
    server.run().await.context("Server terminated with an error")
}
