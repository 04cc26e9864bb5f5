//! Application state and sub-state extractors.
//!
//! AppState is split into domain sub-states so handlers can extract only what
//! they need via Axum's `FromRef`. Every collaborator is held behind a trait
//! object so the upload pipeline can run against in-memory stores and fake
//! media tools.

use crate::auth::JwtService;
use clipvault_core::UnclassifiedPolicy;
use clipvault_db::{UserStore, VideoStore};
use clipvault_processing::{FastStartRemuxer, StreamProber};
use clipvault_storage::{ReferenceResolver, Storage};
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

/// Persistence collaborators.
#[derive(Clone)]
pub struct DbState {
    /// Present when running against Postgres; used by the readiness probe.
    pub pool: Option<PgPool>,
    pub videos: Arc<dyn VideoStore>,
    pub users: Arc<dyn UserStore>,
}

/// Object stores, media tools and upload limits.
#[derive(Clone)]
pub struct MediaConfig {
    /// Video object store.
    pub storage: Arc<dyn Storage>,
    /// Thumbnail store, served under `/assets`.
    pub assets: Arc<dyn Storage>,
    pub references: ReferenceResolver,
    pub prober: Arc<dyn StreamProber>,
    pub normalizer: Arc<dyn FastStartRemuxer>,
    pub max_video_size_bytes: u64,
    pub max_thumbnail_size_bytes: u64,
    /// Parent for per-request staging dirs; system temp dir when unset.
    pub staging_dir: Option<PathBuf>,
    pub unclassified_orientation: UnclassifiedPolicy,
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub jwt: Arc<JwtService>,
}

pub struct AppState {
    pub db: DbState,
    pub media: MediaConfig,
    pub security: SecurityConfig,
}

// ----- FromRef for sub-state extraction -----

impl axum::extract::FromRef<Arc<AppState>> for DbState {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.db.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for MediaConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.media.clone()
    }
}

impl axum::extract::FromRef<Arc<AppState>> for SecurityConfig {
    fn from_ref(state: &Arc<AppState>) -> Self {
        state.security.clone()
    }
}
