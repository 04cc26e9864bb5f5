//! Service initialization and application state setup

use crate::auth::JwtService;
use crate::state::{AppState, DbState, MediaConfig, SecurityConfig};
use anyhow::{Context, Result};
use clipvault_core::Config;
use clipvault_db::{UserRepository, VideoRepository};
use clipvault_processing::{FastStartNormalizer, MediaProber};
use clipvault_storage::{ReferencePolicy, ReferenceResolver, Storage};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Wire repositories, stores and media tools into the application state.
pub async fn initialize_services(
    config: &Config,
    pool: PgPool,
    storage: Arc<dyn Storage>,
    assets: Arc<dyn Storage>,
) -> Result<Arc<AppState>> {
    if let Some(dir) = config.upload_staging_dir() {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("Failed to create staging directory {}", dir.display()))?;
    }

    let db = DbState {
        pool: Some(pool.clone()),
        videos: Arc::new(VideoRepository::new(pool.clone())),
        users: Arc::new(UserRepository::new(pool)),
    };

    let tool_timeout = Duration::from_secs(config.media_tool_timeout_secs());
    let policy = ReferencePolicy::from_config(config);
    tracing::info!(policy = ?policy, "Video reference policy selected");

    let media = MediaConfig {
        references: ReferenceResolver::new(storage.clone(), policy),
        storage,
        assets,
        prober: Arc::new(MediaProber::new(config.ffprobe_path(), tool_timeout)),
        normalizer: Arc::new(FastStartNormalizer::new(config.ffmpeg_path(), tool_timeout)),
        max_video_size_bytes: config.max_video_size_bytes(),
        max_thumbnail_size_bytes: config.max_thumbnail_size_bytes(),
        staging_dir: config.upload_staging_dir().map(|p| p.to_path_buf()),
        unclassified_orientation: config.unclassified_orientation(),
    };

    let security = SecurityConfig {
        jwt: Arc::new(JwtService::new(
            config.jwt_secret(),
            config.jwt_expiry_hours(),
        )),
    };

    Ok(Arc::new(AppState {
        db,
        media,
        security,
    }))
}
