//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::auth::middleware::auth_middleware;
use crate::constants::{API_PREFIX, ASSETS_ROUTE, MULTIPART_OVERHEAD_BYTES};
use crate::handlers::{health, thumbnail_upload, users, video_upload, videos};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use clipvault_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// Body limits derived from the configured file caps.
#[derive(Debug, Clone, Copy)]
struct BodyLimits {
    video: usize,
    thumbnail: usize,
}

impl BodyLimits {
    fn from_config(config: &Config) -> Self {
        let with_overhead =
            |cap: u64| usize::try_from(cap.saturating_add(MULTIPART_OVERHEAD_BYTES)).unwrap_or(usize::MAX);
        Self {
            video: with_overhead(config.max_video_size_bytes()),
            thumbnail: with_overhead(config.max_thumbnail_size_bytes()),
        }
    }

    fn largest(&self) -> usize {
        self.video.max(self.thumbnail)
    }
}

/// Setup all application routes
pub async fn setup_routes(
    config: &Config,
    state: Arc<AppState>,
) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;
    let limits = BodyLimits::from_config(config);

    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_HTTP_CONCURRENCY_LIMIT)
        .max(1);

    let protected = protected_routes(limits).layer(axum::middleware::from_fn_with_state(
        state.security.jwt.clone(),
        auth_middleware,
    ));

    let app = public_routes()
        .merge(protected)
        .merge(utoipa_rapidoc::RapiDoc::new("/api/openapi.json").path("/docs"))
        .nest_service(ASSETS_ROUTE, ServeDir::new(config.assets_root()))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(limits.largest()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        video_body_limit = limits.video,
        thumbnail_body_limit = limits.thumbnail,
        http_concurrency_limit = http_concurrency_limit,
        "Routes configured"
    );

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| {
                o.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

/// Public routes (no authentication required)
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route(&format!("{}/users", API_PREFIX), post(users::create_user))
        .route(&format!("{}/login", API_PREFIX), post(users::login))
}

/// Routes behind the bearer middleware
fn protected_routes(limits: BodyLimits) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            &format!("{}/videos", API_PREFIX),
            post(videos::create_video).get(videos::list_videos),
        )
        .route(
            &format!("{}/videos/{{id}}", API_PREFIX),
            get(videos::get_video).delete(videos::delete_video),
        )
        .route(
            &format!("{}/video_upload/{{id}}", API_PREFIX),
            post(video_upload::upload_video)
                .put(video_upload::upload_video)
                .layer(DefaultBodyLimit::max(limits.video)),
        )
        .route(
            &format!("{}/thumbnail_upload/{{id}}", API_PREFIX),
            post(thumbnail_upload::upload_thumbnail)
                .layer(DefaultBodyLimit::max(limits.thumbnail)),
        )
}
