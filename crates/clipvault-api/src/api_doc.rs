//! OpenAPI documentation, served at `/api/openapi.json` and rendered under `/docs`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth::models;
use crate::error;
use crate::handlers;
use clipvault_core::models as core_models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Clipvault API",
        version = "0.1.0",
        description = "Video hosting API. Uploaded MP4s are probed, remuxed for fast start, filed by orientation and served through direct or presigned URLs."
    ),
    paths(
        // Users
        handlers::users::create_user,
        handlers::users::login,
        // Videos
        handlers::videos::create_video,
        handlers::videos::list_videos,
        handlers::videos::get_video,
        handlers::videos::delete_video,
        // Uploads
        handlers::video_upload::upload_video,
        handlers::thumbnail_upload::upload_thumbnail,
    ),
    components(
        schemas(
            core_models::VideoResponse,
            core_models::CreateVideoRequest,
            core_models::UserResponse,
            models::CreateUserRequest,
            models::LoginRequest,
            models::LoginResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "users", description = "Account creation and login"),
        (name = "videos", description = "Video records, video upload and thumbnails")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_upload_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/video_upload/{id}"));
        assert!(doc.paths.paths.contains_key("/api/thumbnail_upload/{id}"));
        assert!(doc
            .components
            .as_ref()
            .is_some_and(|c| c.security_schemes.contains_key("bearer_auth")));
    }
}
