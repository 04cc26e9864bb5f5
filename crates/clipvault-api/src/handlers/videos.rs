//! Video metadata CRUD.

use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::{DbState, MediaConfig};
use crate::utils::upload::parse_video_id;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use clipvault_core::models::{CreateVideoRequest, VideoRecord, VideoResponse};
use clipvault_core::AppError;
use clipvault_storage::{ReferenceResolver, ReferenceToken};

const MAX_TITLE_LENGTH: usize = 255;

/// Build a response, exchanging the stored reference for a playable URL.
/// The resolved form is never written back.
pub(crate) async fn video_response(
    references: &ReferenceResolver,
    video: VideoRecord,
) -> Result<VideoResponse, HttpAppError> {
    let video_url = references.resolve_optional(video.video_url.as_deref()).await?;
    let mut response = VideoResponse::from(video);
    response.video_url = video_url;
    Ok(response)
}

#[utoipa::path(
    post,
    path = "/api/videos",
    tag = "videos",
    request_body = CreateVideoRequest,
    responses(
        (status = 201, description = "Video record created", body = VideoResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_video(
    State(db): State<DbState>,
    State(media): State<MediaConfig>,
    auth: AuthContext,
    ValidatedJson(request): ValidatedJson<CreateVideoRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let title = request.title.trim();
    if title.is_empty() {
        return Err(AppError::InvalidInput("Title must not be empty".to_string()).into());
    }
    if title.len() > MAX_TITLE_LENGTH {
        return Err(AppError::InvalidInput(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        ))
        .into());
    }

    let video = db
        .videos
        .create_video(auth.user_id, title.to_string(), request.description)
        .await?;

    tracing::info!(video_id = %video.id, user_id = %auth.user_id, "Video record created");

    let response = video_response(&media.references, video).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/api/videos",
    tag = "videos",
    responses(
        (status = 200, description = "Caller's videos, newest first", body = Vec<VideoResponse>),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_videos(
    State(db): State<DbState>,
    State(media): State<MediaConfig>,
    auth: AuthContext,
) -> Result<Json<Vec<VideoResponse>>, HttpAppError> {
    let videos = db.videos.list_videos_for_user(auth.user_id).await?;

    let mut responses = Vec::with_capacity(videos.len());
    for video in videos {
        responses.push(video_response(&media.references, video).await?);
    }

    Ok(Json(responses))
}

#[utoipa::path(
    get,
    path = "/api/videos/{id}",
    tag = "videos",
    params(("id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video record", body = VideoResponse),
        (status = 400, description = "Invalid video ID", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_video(
    State(db): State<DbState>,
    State(media): State<MediaConfig>,
    _auth: AuthContext,
    Path(id): Path<String>,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let id = parse_video_id(&id)?;
    let video = db
        .videos
        .get_video(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    Ok(Json(video_response(&media.references, video).await?))
}

#[utoipa::path(
    delete,
    path = "/api/videos/{id}",
    tag = "videos",
    params(("id" = String, Path, description = "Video ID")),
    responses(
        (status = 204, description = "Video deleted"),
        (status = 403, description = "Not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_video(
    State(db): State<DbState>,
    State(media): State<MediaConfig>,
    auth: AuthContext,
    Path(id): Path<String>,
) -> Result<StatusCode, HttpAppError> {
    let id = parse_video_id(&id)?;
    let video = db
        .videos
        .get_video(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))?;

    if !video.is_owned_by(auth.user_id) {
        return Err(AppError::Forbidden("Not the owner of this video".to_string()).into());
    }

    if !db.videos.delete_video(id).await? {
        return Err(AppError::NotFound(format!("Video {} not found", id)).into());
    }

    // Only tokens name an object this deployment owns.
    if let Some(token) = video.video_url.as_deref().and_then(ReferenceToken::parse) {
        if token.bucket == media.storage.bucket() {
            if let Err(e) = media.storage.delete(&token.key).await {
                tracing::warn!(
                    video_id = %id,
                    key = %token.key,
                    error = %e,
                    "Failed to delete stored video object"
                );
            }
        }
    }

    tracing::info!(video_id = %id, user_id = %auth.user_id, "Video deleted");
    Ok(StatusCode::NO_CONTENT)
}
