//! progress-engine server entry point.
//!
//! Selects the storage backend, builds the progress service and serves the
//! REST API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use progress_engine::api;
use progress_engine::app_state::AppState;
use progress_engine::config::{EngineConfig, StorageBackend};
use progress_engine::persistence::{MemoryStore, PostgresStore};
use progress_engine::service::ProgressService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = EngineConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;
    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.storage_backend,
        "starting progress-engine"
    );

    // Build service layer
    let service = match config.storage_backend {
        StorageBackend::Postgres => {
            let store = PostgresStore::connect(&config)
                .await
                .context("connecting to PostgreSQL")?;
            if config.run_migrations {
                store.migrate().await.context("running migrations")?;
                tracing::info!("database migrations applied");
            }
            ProgressService::from_store(Arc::new(store))
        }
        StorageBackend::Memory => {
            let store = match &config.memory_seed_path {
                Some(path) => MemoryStore::load_seed(path)
                    .await
                    .context("loading memory seed")?,
                None => MemoryStore::new(),
            };
            ProgressService::from_store(Arc::new(store))
        }
    }
    .with_rollup_concurrency(config.rollup_concurrency);

    // Build router
    let app = api::build_app(
        AppState::new(service),
        Duration::from_secs(config.request_timeout_secs),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
