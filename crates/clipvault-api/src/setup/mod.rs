//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded `Config` to a served router.

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::Result;
use clipvault_core::Config;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    crate::telemetry::init_telemetry(config.environment());

    tracing::info!(
        environment = %config.environment(),
        storage_backend = %config.storage_backend(),
        reference_mode = %config.video_reference_mode(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;

    let storage = storage::setup_storage(&config).await?;
    let assets = storage::setup_assets(&config).await?;

    let state = services::initialize_services(&config, pool, storage, assets).await?;

    let router = routes::setup_routes(&config, state.clone()).await?;

    Ok((state, router))
}
