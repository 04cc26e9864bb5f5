use crate::auth::AuthContext;
use crate::constants::{VIDEO_CONTENT_TYPE, VIDEO_FIELD};
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::videos::video_response;
use crate::services::upload::{
    StagedUpload, StagingArea, StagingError, UploadSession, UploadStage, VideoUploadPipeline,
};
use crate::state::{AppState, MediaConfig};
use crate::utils::upload::{
    header_content_type, is_multipart, is_video_content_type, parse_video_id,
};
use axum::{
    extract::{FromRequest, Multipart, Path, Request, State},
    Json,
};
use clipvault_core::models::VideoResponse;
use clipvault_core::AppError;
use futures::TryStreamExt;
use std::sync::Arc;

fn wrong_type(found: Option<&str>) -> AppError {
    AppError::InvalidInput(format!(
        "Invalid content type {}; expected {}",
        found.unwrap_or("(none)"),
        VIDEO_CONTENT_TYPE
    ))
}

/// Stage the `video` part of a multipart body. The part's declared type is
/// checked before any file is created.
async fn stage_multipart(
    mut multipart: Multipart,
    media: &MediaConfig,
) -> Result<StagedUpload, AppError> {
    let limit = media.max_video_size_bytes;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StagingError::from_multipart(e, limit))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        if !content_type.as_deref().is_some_and(is_video_content_type) {
            return Err(wrong_type(content_type.as_deref()));
        }

        let area = StagingArea::create(media.staging_dir.as_deref())?;
        let body = field.map_err(move |e| StagingError::from_multipart(e, limit));
        return Ok(area.stage(body, limit).await?);
    }

    Err(AppError::InvalidInput(format!(
        "Missing '{}' file field",
        VIDEO_FIELD
    )))
}

/// Stage a raw `video/mp4` request body.
async fn stage_raw_body(request: Request, media: &MediaConfig) -> Result<StagedUpload, AppError> {
    let content_type = header_content_type(request.headers());
    if !content_type.is_some_and(is_video_content_type) {
        return Err(wrong_type(content_type));
    }

    let area = StagingArea::create(media.staging_dir.as_deref())?;
    let body = request
        .into_body()
        .into_data_stream()
        .map_err(|e| StagingError::Body(e.to_string()));
    Ok(area.stage(body, media.max_video_size_bytes).await?)
}

#[utoipa::path(
    post,
    path = "/api/video_upload/{id}",
    tag = "videos",
    params(("id" = String, Path, description = "Video ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "A single `video` part of type video/mp4, or a raw video/mp4 body"),
    responses(
        (status = 200, description = "Video stored and record updated", body = VideoResponse),
        (status = 400, description = "Bad id, missing file or wrong media type", body = ErrorResponse),
        (status = 401, description = "Missing token or not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "Video too large", body = ErrorResponse),
        (status = 500, description = "Staging, probe, remux, upload or record write failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_video(
    State(state): State<Arc<AppState>>,
    auth: AuthContext,
    Path(id): Path<String>,
    request: Request,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let video_id = parse_video_id(&id)?;
    let media = &state.media;

    let mut session = UploadSession::new(video_id, auth.user_id);
    let pipeline = VideoUploadPipeline::new(&state.db, media);

    pipeline.authorize(&mut session).await?;

    let staged = if is_multipart(request.headers()) {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))
            .map_err(|e| session.fail(UploadStage::Staged, e))?;
        stage_multipart(multipart, media).await
    } else {
        stage_raw_body(request, media).await
    }
    .map_err(|e| session.fail(UploadStage::Staged, e))?;

    tracing::debug!(
        video_id = %video_id,
        size_bytes = staged.size(),
        path = %staged.path().display(),
        "Upload staged"
    );
    session.advance(UploadStage::Staged);

    let record = pipeline.complete(&mut session, &staged).await?;
    drop(staged);

    let response = video_response(&media.references, record).await?;
    session.advance(UploadStage::Complete);

    Ok(Json(response))
}
