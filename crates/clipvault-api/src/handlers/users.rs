//! Account creation and login.

use crate::auth::models::{CreateUserRequest, LoginRequest, LoginResponse};
use crate::auth::password::{hash_password, verify_password};
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::{DbState, SecurityConfig};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use clipvault_core::models::UserResponse;
use clipvault_core::AppError;

const MIN_PASSWORD_LENGTH: usize = 8;

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::InvalidInput("A valid email is required".to_string()));
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(db): State<DbState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let email = request.email.trim().to_lowercase();
    validate_credentials(&email, &request.password)?;

    let password_hash = hash_password(&request.password)?;
    let user = db.users.create_user(email, password_hash).await?;

    tracing::info!(user_id = %user.id, "User created");
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/api/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(db): State<DbState>,
    State(security): State<SecurityConfig>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpAppError> {
    let invalid = || AppError::Unauthorized("Incorrect email or password".to_string());

    let email = request.email.trim().to_lowercase();
    let user = db
        .users
        .get_user_by_email(&email)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(&request.password, &user.password_hash)? {
        tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid().into());
    }

    let token = security.jwt.issue(user.id)?;
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse::new(user, token)))
}
