//! Upload orchestrator
//!
//! Drives one upload through
//! `Received → Authorized → Staged → Probed → Normalized → Uploaded → Recorded → Complete`.
//! Stages run strictly in sequence inside the request. The record's
//! `video_url` is written exactly once, after the object store accepted the
//! normalized file.

use crate::constants::VIDEO_CONTENT_TYPE;
use crate::error::{fast_start_failure, probe_failure, store_upload_failure};
use crate::services::upload::staging::StagedUpload;
use crate::state::{DbState, MediaConfig};
use clipvault_core::models::{OrientationClass, StoredAsset, VideoRecord};
use clipvault_core::{AppError, UnclassifiedPolicy};
use clipvault_db::VideoStore;
use clipvault_processing::{FastStartRemuxer, StreamProber};
use clipvault_storage::{ByteReader, ReferenceResolver, Storage};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStage {
    Received,
    Authorized,
    Staged,
    Probed,
    Normalized,
    Uploaded,
    Recorded,
    Complete,
}

impl UploadStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStage::Received => "received",
            UploadStage::Authorized => "authorized",
            UploadStage::Staged => "staged",
            UploadStage::Probed => "probed",
            UploadStage::Normalized => "normalized",
            UploadStage::Uploaded => "uploaded",
            UploadStage::Recorded => "recorded",
            UploadStage::Complete => "complete",
        }
    }
}

impl Display for UploadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Progress of a single upload request, used for stage-scoped logging.
#[derive(Debug)]
pub struct UploadSession {
    video_id: Uuid,
    user_id: Uuid,
    stage: UploadStage,
    started_at: Instant,
    stage_started_at: Instant,
}

impl UploadSession {
    pub fn new(video_id: Uuid, user_id: Uuid) -> Self {
        let now = Instant::now();
        Self {
            video_id,
            user_id,
            stage: UploadStage::Received,
            started_at: now,
            stage_started_at: now,
        }
    }

    pub fn video_id(&self) -> Uuid {
        self.video_id
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn stage(&self) -> UploadStage {
        self.stage
    }

    /// Record that `next` was reached.
    pub fn advance(&mut self, next: UploadStage) {
        let duration_ms = self.stage_started_at.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            video_id = %self.video_id,
            user_id = %self.user_id,
            stage = %next,
            duration_ms = duration_ms,
            "Upload stage completed"
        );
        if next == UploadStage::Complete {
            tracing::info!(
                video_id = %self.video_id,
                user_id = %self.user_id,
                total_ms = self.started_at.elapsed().as_secs_f64() * 1000.0,
                "Video upload complete"
            );
        }
        self.stage = next;
        self.stage_started_at = Instant::now();
    }

    /// Log the failure of the transition into `failed` and hand the error back.
    pub fn fail(&self, failed: UploadStage, error: AppError) -> AppError {
        let duration_ms = self.stage_started_at.elapsed().as_secs_f64() * 1000.0;
        tracing::error!(
            video_id = %self.video_id,
            user_id = %self.user_id,
            stage = %failed,
            last_completed_stage = %self.stage,
            duration_ms = duration_ms,
            error = %error,
            "Video upload failed"
        );
        error
    }
}

/// The stage sequence after the HTTP layer has parsed the target id.
#[derive(Clone)]
pub struct VideoUploadPipeline {
    videos: Arc<dyn VideoStore>,
    storage: Arc<dyn Storage>,
    references: ReferenceResolver,
    prober: Arc<dyn StreamProber>,
    normalizer: Arc<dyn FastStartRemuxer>,
    unclassified: UnclassifiedPolicy,
}

impl VideoUploadPipeline {
    pub fn new(db: &DbState, media: &MediaConfig) -> Self {
        Self {
            videos: db.videos.clone(),
            storage: media.storage.clone(),
            references: media.references.clone(),
            prober: media.prober.clone(),
            normalizer: media.normalizer.clone(),
            unclassified: media.unclassified_orientation,
        }
    }

    /// Received → Authorized: the record must exist and belong to the caller.
    pub async fn authorize(&self, session: &mut UploadSession) -> Result<VideoRecord, AppError> {
        let video = self
            .videos
            .get_video(session.video_id)
            .await
            .map_err(|e| session.fail(UploadStage::Authorized, e))?
            .ok_or_else(|| {
                session.fail(
                    UploadStage::Authorized,
                    AppError::NotFound(format!("Video {} not found", session.video_id)),
                )
            })?;

        if !video.is_owned_by(session.user_id) {
            return Err(session.fail(
                UploadStage::Authorized,
                AppError::Unauthorized("Not the owner of this video".to_string()),
            ));
        }

        session.advance(UploadStage::Authorized);
        Ok(video)
    }

    /// Staged → Probed → Normalized → Uploaded → Recorded.
    ///
    /// Returns the stored record as persisted, before any reference resolution.
    pub async fn complete(
        &self,
        session: &mut UploadSession,
        staged: &StagedUpload,
    ) -> Result<VideoRecord, AppError> {
        let report = self
            .prober
            .probe(staged.path())
            .await
            .map_err(|e| session.fail(UploadStage::Probed, probe_failure(e)))?;
        let orientation = OrientationClass::from_aspect_ratio(report.aspect_ratio, self.unclassified);
        tracing::debug!(
            video_id = %session.video_id,
            dimensions = %report.dimensions,
            aspect_ratio = %report.aspect_ratio,
            orientation = %orientation,
            "Classified upload"
        );
        session.advance(UploadStage::Probed);

        let normalized = self
            .normalizer
            .normalize(staged.path())
            .await
            .map_err(|e| session.fail(UploadStage::Normalized, fast_start_failure(e)))?;
        session.advance(UploadStage::Normalized);

        let asset = StoredAsset::generate(orientation);
        let key = asset.key();
        let file = tokio::fs::File::open(&normalized).await.map_err(|e| {
            session.fail(
                UploadStage::Uploaded,
                AppError::Staging(format!("Failed to open normalized file: {}", e)),
            )
        })?;
        let size = file
            .metadata()
            .await
            .map_err(|e| session.fail(UploadStage::Uploaded, AppError::Staging(e.to_string())))?
            .len();
        let reader: ByteReader = Box::pin(file);

        self.storage
            .put_stream(&key, reader, Some(size), VIDEO_CONTENT_TYPE)
            .await
            .map_err(|e| session.fail(UploadStage::Uploaded, store_upload_failure(e)))?;
        tracing::info!(
            video_id = %session.video_id,
            bucket = %self.storage.bucket(),
            key = %key,
            size_bytes = size,
            "Stored normalized video"
        );
        session.advance(UploadStage::Uploaded);

        // Only the reference column is written; edits made while the
        // pipeline ran stay intact.
        let reference = self.references.reference_for(&key);
        match self.videos.set_video_url(session.video_id, &reference).await {
            Ok(record) => {
                session.advance(UploadStage::Recorded);
                Ok(record)
            }
            Err(e) => {
                self.discard_orphan(session, &key).await;
                Err(session.fail(UploadStage::Recorded, e))
            }
        }
    }

    /// The object landed but no record points at it. One delete attempt, no retry.
    async fn discard_orphan(&self, session: &UploadSession, key: &str) {
        tracing::error!(
            video_id = %session.video_id,
            bucket = %self.storage.bucket(),
            key = %key,
            "Record write failed after store upload; object is orphaned"
        );
        match self.storage.delete(key).await {
            Ok(()) => tracing::info!(key = %key, "Removed orphaned object"),
            Err(e) => tracing::warn!(
                key = %key,
                error = %e,
                "Failed to remove orphaned object"
            ),
        }
    }
}
