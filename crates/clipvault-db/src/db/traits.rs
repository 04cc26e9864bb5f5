use clipvault_core::models::{User, VideoRecord};
use clipvault_core::AppError;
use uuid::Uuid;

/// Video metadata persistence.
#[async_trait::async_trait]
pub trait VideoStore: Send + Sync {
    async fn create_video(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
    ) -> Result<VideoRecord, AppError>;

    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError>;

    /// The owner's videos, newest first.
    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError>;

    /// Set only `video_url` (and `updated_at`), leaving every other column as
    /// currently stored. Fails with `AppError::NotFound` if the record is gone.
    async fn set_video_url(&self, id: Uuid, video_url: &str) -> Result<VideoRecord, AppError>;

    /// Set only `thumbnail_url` (and `updated_at`).
    async fn set_thumbnail_url(
        &self,
        id: Uuid,
        thumbnail_url: &str,
    ) -> Result<VideoRecord, AppError>;

    /// Returns `false` if nothing was deleted.
    async fn delete_video(&self, id: Uuid) -> Result<bool, AppError>;
}

/// User account persistence.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `AppError::Conflict` if the email is taken.
    async fn create_user(&self, email: String, password_hash: String) -> Result<User, AppError>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
}
