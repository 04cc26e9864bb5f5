//! Health check handlers.

use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const CHECK_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub database: String,
    pub storage: String,
}

async fn database_status(state: &AppState) -> String {
    let Some(pool) = state.db.pool.as_ref() else {
        return "not configured".to_string();
    };

    let check = sqlx::query("SELECT 1").execute(pool);
    match tokio::time::timeout(CHECK_TIMEOUT, check).await {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => format!("unhealthy: {}", e),
        Err(_) => "timeout".to_string(),
    }
}

/// Liveness plus a database round trip.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let database = database_status(&state).await;
    let healthy = database == "healthy" || state.db.pool.is_none();

    let response = HealthCheckResponse {
        status: if healthy { "healthy" } else { "degraded" }.to_string(),
        database,
        storage: state.media.storage.backend_type().to_string(),
    };

    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
