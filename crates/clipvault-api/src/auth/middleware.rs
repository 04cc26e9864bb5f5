use crate::auth::jwt::JwtService;
use crate::auth::models::AuthContext;
use crate::error::HttpAppError;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use clipvault_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the raw token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    let token = header
        .strip_prefix(BEARER_PREFIX)
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization header format".to_string()))?
        .trim();

    if token.is_empty() {
        return Err(AppError::Unauthorized("Empty bearer token".to_string()));
    }

    Ok(token)
}

/// Resolve the caller's user id from the request headers.
pub fn resolve_bearer_token(jwt: &JwtService, headers: &HeaderMap) -> Result<Uuid, AppError> {
    let token = bearer_token(headers)?;
    Ok(jwt.validate(token)?.sub)
}

pub async fn auth_middleware(
    State(jwt): State<Arc<JwtService>>,
    mut request: Request,
    next: Next,
) -> Response {
    match resolve_bearer_token(&jwt, request.headers()) {
        Ok(user_id) => {
            request.extensions_mut().insert(AuthContext { user_id });
            next.run(request).await
        }
        Err(e) => {
            tracing::debug!(
                path = %request.uri().path(),
                reason = %e,
                "Rejected unauthenticated request"
            );
            HttpAppError(e).into_response()
        }
    }
}
