//! Upload staging
//!
//! Every upload gets its own temporary directory. The staged body and the
//! fast-start derivative (`<staged>.processing`) both live inside it, so
//! dropping the [`StagingArea`] releases all local files on every exit path.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use bytes::Bytes;
use clipvault_core::AppError;
use futures::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

const STAGING_DIR_PREFIX: &str = "clipvault-upload-";
const STAGED_FILE_NAME: &str = "upload.mp4";

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Upload exceeds the maximum size of {limit} bytes")]
    TooLarge { limit: u64 },

    #[error("Failed to read request body: {0}")]
    Body(String),

    #[error("Failed to write staged upload: {0}")]
    Io(#[from] std::io::Error),
}

impl StagingError {
    /// Classify a multipart read failure. axum reports its own body limit as 413.
    pub fn from_multipart(err: MultipartError, limit: u64) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            StagingError::TooLarge { limit }
        } else {
            StagingError::Body(err.body_text())
        }
    }
}

impl From<StagingError> for AppError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::TooLarge { limit } => AppError::PayloadTooLarge(format!(
                "Video exceeds maximum allowed size of {} MB",
                limit / 1024 / 1024
            )),
            StagingError::Body(msg) => AppError::BadRequest(msg),
            StagingError::Io(e) => AppError::Staging(e.to_string()),
        }
    }
}

/// Per-request scratch directory.
#[derive(Debug)]
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    /// Create a fresh directory under `parent`, or the system temp dir.
    pub fn create(parent: Option<&Path>) -> Result<Self, StagingError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(STAGING_DIR_PREFIX);
        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Stream `body` into the staged file, failing as soon as more than
    /// `limit` bytes have arrived.
    pub async fn stage<S>(self, body: S, limit: u64) -> Result<StagedUpload, StagingError>
    where
        S: Stream<Item = Result<Bytes, StagingError>>,
    {
        let path = self.dir.path().join(STAGED_FILE_NAME);
        let size = write_capped(body, &path, limit).await?;
        Ok(StagedUpload {
            area: self,
            path,
            size,
        })
    }
}

/// A fully staged upload. Dropping it deletes the staging directory.
#[derive(Debug)]
pub struct StagedUpload {
    area: StagingArea,
    path: PathBuf,
    size: u64,
}

impl StagedUpload {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn dir(&self) -> &Path {
        self.area.path()
    }
}

async fn write_capped<S>(body: S, path: &Path, limit: u64) -> Result<u64, StagingError>
where
    S: Stream<Item = Result<Bytes, StagingError>>,
{
    let mut body = std::pin::pin!(body);
    let mut file = tokio::fs::File::create(path).await?;
    let mut written: u64 = 0;

    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        if written > limit {
            tracing::debug!(limit, received = written, "Upload exceeded size limit");
            return Err(StagingError::TooLarge { limit });
        }
        file.write_all(&chunk).await?;
    }

    file.flush().await?;
    file.sync_all().await?;
    Ok(written)
}
