mod app;
mod config;
mod dto;
mod error;
mod handlers;
mod models;
mod repository;
mod service;

use std::sync::Arc;

use repository::Repository;
use service::NoteService;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Log setup
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load config
    let cfg = config::load_config().unwrap_or_else(|e| {
        tracing::error!("Failed to load configuration: {e}");
        panic!("failed to load configuration: {e}");
    });

    // Repository creation and schema setup
    let repo = Repository::connect(&cfg.database_url)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to establish database connection: {e}");
            panic!("failed to establish database connection: {e}");
        });

    repo.ensure_schema().await.unwrap_or_else(|e| {
        tracing::error!("Failed to create database schema: {e}");
        panic!("failed to create database schema: {e}");
    });

    // Service creation
    let service = Arc::new(NoteService::new(repo));

    let router = app::build_router(service, &cfg.cors_allow_origins);

    let listener = tokio::net::TcpListener::bind(cfg.bind_addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind to {}: {e}", cfg.bind_addr);
            panic!("failed to bind to {}: {e}", cfg.bind_addr);
        });

    tracing::info!(
        "Notes server starting, listening on {}, CORS origins: {:?}",
        cfg.bind_addr,
        cfg.cors_allow_origins
    );

    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!("HTTP server error: {e}");
        panic!("failed to start HTTP server: {e}");
    }
}
