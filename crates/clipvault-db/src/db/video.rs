use super::traits::VideoStore;
use clipvault_core::{models::VideoRecord, AppError};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const VIDEO_COLUMNS: &str =
    "id, user_id, title, description, thumbnail_url, video_url, created_at, updated_at";

/// Repository for video metadata records
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VideoStore for VideoRepository {
    #[tracing::instrument(skip(self, description), fields(db.table = "videos", db.operation = "insert"))]
    async fn create_video(
        &self,
        user_id: Uuid,
        title: String,
        description: String,
    ) -> Result<VideoRecord, AppError> {
        let video = VideoRecord::new(user_id, title, description);

        let created = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            r#"
            INSERT INTO videos (id, user_id, title, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {VIDEO_COLUMNS}
            "#
        ))
        .bind(video.id)
        .bind(video.user_id)
        .bind(&video.title)
        .bind(&video.description)
        .bind(video.created_at)
        .bind(video.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select", db.record_id = %id))]
    async fn get_video(&self, id: Uuid) -> Result<Option<VideoRecord>, AppError> {
        let video = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(video)
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "select"))]
    async fn list_videos_for_user(&self, user_id: Uuid) -> Result<Vec<VideoRecord>, AppError> {
        let videos = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(videos)
    }

    #[tracing::instrument(skip(self, video_url), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_video_url(&self, id: Uuid, video_url: &str) -> Result<VideoRecord, AppError> {
        let updated = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            "UPDATE videos SET video_url = $2, updated_at = NOW() WHERE id = $1 RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(id)
        .bind(video_url)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    #[tracing::instrument(skip(self, thumbnail_url), fields(db.table = "videos", db.operation = "update", db.record_id = %id))]
    async fn set_thumbnail_url(
        &self,
        id: Uuid,
        thumbnail_url: &str,
    ) -> Result<VideoRecord, AppError> {
        let updated = sqlx::query_as::<Postgres, VideoRecord>(&format!(
            "UPDATE videos SET thumbnail_url = $2, updated_at = NOW() WHERE id = $1 RETURNING {VIDEO_COLUMNS}"
        ))
        .bind(id)
        .bind(thumbnail_url)
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| AppError::NotFound(format!("Video {} not found", id)))
    }

    #[tracing::instrument(skip(self), fields(db.table = "videos", db.operation = "delete", db.record_id = %id))]
    async fn delete_video(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
