use crate::auth::AuthContext;
use crate::constants::{THUMBNAIL_CONTENT_TYPES, THUMBNAIL_FIELD};
use crate::error::{ErrorResponse, HttpAppError};
use crate::handlers::videos::video_response;
use crate::services::upload::StagingError;
use crate::state::{DbState, MediaConfig};
use crate::utils::upload::{parse_video_id, thumbnail_extension};
use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use bytes::{Bytes, BytesMut};
use clipvault_core::models::VideoResponse;
use clipvault_core::AppError;
use rand::Rng;

const NAME_RANDOM_BYTES: usize = 32;

/// 32 random bytes, base64url without padding, plus the extension.
fn random_asset_name(extension: &str) -> String {
    let mut bytes = [0u8; NAME_RANDOM_BYTES];
    rand::rng().fill(&mut bytes);
    format!("{}.{}", URL_SAFE_NO_PAD.encode(bytes), extension)
}

struct ThumbnailPart {
    data: Bytes,
    content_type: String,
    extension: &'static str,
}

async fn read_thumbnail(mut multipart: Multipart, limit: u64) -> Result<ThumbnailPart, AppError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| StagingError::from_multipart(e, limit))?
    {
        if field.name() != Some(THUMBNAIL_FIELD) {
            continue;
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        let extension = thumbnail_extension(&content_type).ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Invalid thumbnail content type. Allowed types: {}",
                THUMBNAIL_CONTENT_TYPES.join(", ")
            ))
        })?;

        let mut data = BytesMut::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| StagingError::from_multipart(e, limit))?
        {
            if (data.len() + chunk.len()) as u64 > limit {
                return Err(AppError::PayloadTooLarge(format!(
                    "Thumbnail exceeds maximum allowed size of {} MB",
                    limit / 1024 / 1024
                )));
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(ThumbnailPart {
            data: data.freeze(),
            content_type,
            extension,
        });
    }

    Err(AppError::InvalidInput(format!(
        "Missing '{}' file field",
        THUMBNAIL_FIELD
    )))
}

#[utoipa::path(
    post,
    path = "/api/thumbnail_upload/{id}",
    tag = "videos",
    params(("id" = String, Path, description = "Video ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Thumbnail stored and record updated", body = VideoResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Missing token or not the owner", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 413, description = "Thumbnail too large", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_thumbnail(
    State(db): State<DbState>,
    State(media): State<MediaConfig>,
    auth: AuthContext,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<VideoResponse>, HttpAppError> {
    let video_id = parse_video_id(&id)?;

    let video = db
        .videos
        .get_video(video_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Video {} not found", video_id)))?;

    if !video.is_owned_by(auth.user_id) {
        return Err(AppError::Unauthorized("Not the owner of this video".to_string()).into());
    }

    let part = read_thumbnail(multipart, media.max_thumbnail_size_bytes).await?;
    let size = part.data.len();
    let name = random_asset_name(part.extension);

    let url = media
        .assets
        .put_bytes(&name, part.data, &part.content_type)
        .await?;

    let video = db.videos.set_thumbnail_url(video_id, &url).await?;

    tracing::info!(
        video_id = %video_id,
        user_id = %auth.user_id,
        name = %name,
        size_bytes = size,
        "Thumbnail uploaded"
    );

    Ok(Json(video_response(&media.references, video).await?))
}
