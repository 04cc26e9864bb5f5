//! HTTP error response conversion
//!
//! Handlers return `Result<impl IntoResponse, HttpAppError>`. Library errors
//! (`StorageError`, `ProbeError`, `FastStartError`) convert into the matching
//! pipeline-stage `AppError` variant so every failure renders the same way.

use axum::{
    extract::rejection::JsonRejection,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use clipvault_core::{AppError, ErrorMetadata, LogLevel};
use clipvault_processing::{FastStartError, ProbeError};
use clipvault_storage::StorageError;
use serde::{de::DeserializeOwned, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code for programmatic handling
    pub code: String,
    /// Whether this error is recoverable (can be retried)
    pub recoverable: bool,
    /// Suggested action for the client
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

/// Wrapper type for AppError to implement IntoResponse
/// (orphan rules: both IntoResponse and AppError are foreign to this crate).
#[derive(Debug)]
pub struct HttpAppError(pub AppError);

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

/// Convert JSON body deserialization failures into a 400 with our ErrorResponse format.
impl From<JsonRejection> for HttpAppError {
    fn from(rejection: JsonRejection) -> Self {
        HttpAppError(AppError::InvalidInput(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

/// JSON body extractor that answers malformed bodies with our ErrorResponse (400 + JSON).
#[derive(Debug, Clone, Copy)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(inner) = Json::<T>::from_request(req, state)
            .await
            .map_err(HttpAppError::from)?;
        Ok(ValidatedJson(inner))
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

fn error_body(app_error: &AppError, with_details: bool) -> ErrorResponse {
    ErrorResponse {
        error: app_error.client_message(),
        details: with_details.then(|| app_error.detailed_message()),
        error_type: with_details.then(|| app_error.error_type().to_string()),
        code: app_error.error_code().to_string(),
        recoverable: app_error.is_recoverable(),
        suggested_action: app_error.suggested_action().map(String::from),
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        // Details only outside production, and never for sensitive errors.
        let with_details = !is_production_env() && !app_error.is_sensitive();

        (status, Json(error_body(app_error, with_details))).into_response()
    }
}

/// Object store failure, classified for the upload stage.
pub fn store_upload_failure(err: StorageError) -> AppError {
    match err {
        StorageError::InvalidKey(msg) => AppError::Internal(format!("Invalid storage key: {}", msg)),
        other => AppError::StoreUpload(other.to_string()),
    }
}

pub fn probe_failure(err: ProbeError) -> AppError {
    AppError::MediaProbe(err.to_string())
}

pub fn fast_start_failure(err: FastStartError) -> AppError {
    AppError::FastStart(err.to_string())
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app = match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::UploadFailed(msg) => AppError::StoreUpload(msg),
            StorageError::DeleteFailed(msg) => AppError::Storage(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::InvalidReference(msg) => {
                AppError::Storage(format!("Unresolvable video reference: {}", msg))
            }
            StorageError::BackendError(msg) => AppError::Storage(msg),
            StorageError::IoError(err) => AppError::Internal(format!("IO error: {}", err)),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
        };
        HttpAppError(app)
    }
}

impl From<ProbeError> for HttpAppError {
    fn from(err: ProbeError) -> Self {
        HttpAppError(probe_failure(err))
    }
}

impl From<FastStartError> for HttpAppError {
    fn from(err: FastStartError) -> Self {
        HttpAppError(fast_start_failure(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_storage_error_not_found() {
        let storage_err = StorageError::NotFound("File not found".to_string());
        let HttpAppError(app_err) = storage_err.into();
        match app_err {
            AppError::NotFound(msg) => assert_eq!(msg, "File not found"),
            _ => panic!("Expected NotFound variant"),
        }
    }

    #[test]
    fn test_from_storage_error_upload_failed() {
        let storage_err = StorageError::UploadFailed("bucket quota exceeded".to_string());
        let HttpAppError(app_err) = storage_err.into();
        assert!(matches!(app_err, AppError::StoreUpload(ref msg) if msg == "bucket quota exceeded"));
        assert_eq!(app_err.error_code(), "STORE_UPLOAD_FAILED");
    }

    #[test]
    fn test_from_storage_error_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "IO error");
        let HttpAppError(app_err) = StorageError::IoError(io_err).into();
        match app_err {
            AppError::Internal(msg) => assert!(msg.contains("IO error")),
            _ => panic!("Expected Internal variant"),
        }
    }

    #[test]
    fn test_probe_and_fast_start_errors_keep_their_stage() {
        let HttpAppError(probe) = ProbeError::NoStreams.into();
        assert_eq!(probe.error_code(), "MEDIA_PROBE_FAILED");
        assert_eq!(probe.http_status_code(), 500);

        let HttpAppError(remux) =
            FastStartError::MissingOutput(std::path::PathBuf::from("/tmp/x.processing")).into();
        assert_eq!(remux.error_code(), "FAST_START_FAILED");
        assert_eq!(remux.http_status_code(), 500);
    }

    #[test]
    fn test_store_upload_failure_classification() {
        let err = store_upload_failure(StorageError::BackendError("503".to_string()));
        assert!(matches!(err, AppError::StoreUpload(_)));
    }

    #[test]
    fn test_error_body_hides_details_when_asked() {
        let err = AppError::NotFound("Video x".to_string());
        let hidden = serde_json::to_value(error_body(&err, false)).expect("serialize");
        assert!(hidden.get("details").is_none());
        assert_eq!(hidden["code"], "NOT_FOUND");
        assert_eq!(hidden["recoverable"], false);

        let shown = serde_json::to_value(error_body(&err, true)).expect("serialize");
        assert_eq!(shown["error_type"], "NotFound");
    }
}
