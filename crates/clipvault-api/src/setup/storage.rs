//! Storage setup and initialization

use crate::constants::ASSETS_ROUTE;
use anyhow::{Context, Result};
use clipvault_core::Config;
use clipvault_storage::{create_storage, LocalStorage, Storage};
use std::sync::Arc;

/// Video object store selected by `STORAGE_BACKEND`.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing video storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize video storage")?;
    tracing::info!(
        backend = %storage.backend_type(),
        bucket = %storage.bucket(),
        "Video storage initialized"
    );
    Ok(storage)
}

/// Thumbnail store rooted at `ASSETS_ROOT`, addressed as `{PUBLIC_BASE_URL}/assets/<name>`.
pub async fn setup_assets(config: &Config) -> Result<Arc<dyn Storage>> {
    let base_url = assets_base_url(config.public_base_url());
    let assets = LocalStorage::new(config.assets_root(), base_url.clone())
        .await
        .context("Failed to initialize assets directory")?;
    tracing::info!(
        path = %config.assets_root().display(),
        base_url = %base_url,
        "Assets storage initialized"
    );
    Ok(Arc::new(assets))
}

pub fn assets_base_url(public_base_url: &str) -> String {
    format!("{}{}", public_base_url.trim_end_matches('/'), ASSETS_ROUTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assets_base_url() {
        assert_eq!(
            assets_base_url("http://localhost:8091/"),
            "http://localhost:8091/assets"
        );
        assert_eq!(
            assets_base_url("https://media.example.com"),
            "https://media.example.com/assets"
        );
    }
}
