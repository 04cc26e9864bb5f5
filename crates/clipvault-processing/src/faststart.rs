//! Fast-Start Normalizer: relocate the `moov` atom with `ffmpeg -c copy`.

use crate::command::ToolCommand;
use crate::error::FastStartError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PROCESSING_SUFFIX: &str = ".processing";

/// `<input>.processing`, next to the input.
pub fn processing_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(PROCESSING_SUFFIX);
    PathBuf::from(name)
}

/// Produces a fast-start copy of an MP4 and returns its path.
///
/// The input is left in place; the caller owns cleanup of both files.
#[async_trait]
pub trait FastStartRemuxer: Send + Sync {
    async fn normalize(&self, input: &Path) -> Result<PathBuf, FastStartError>;
}

#[derive(Debug, Clone)]
pub struct FastStartNormalizer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FastStartNormalizer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            timeout,
        }
    }

    fn command(&self, input: &Path, output: &Path) -> ToolCommand {
        ToolCommand::new(self.ffmpeg_path.clone(), self.timeout)
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output)
    }
}

#[async_trait]
impl FastStartRemuxer for FastStartNormalizer {
    #[tracing::instrument(skip(self), fields(input = %input.display()))]
    async fn normalize(&self, input: &Path) -> Result<PathBuf, FastStartError> {
        let output = processing_path(input);

        if let Err(e) = self.command(input, &output).run().await {
            // ffmpeg may leave a truncated file behind.
            if let Err(remove_err) = tokio::fs::remove_file(&output).await {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(
                        error = %remove_err,
                        path = %output.display(),
                        "Failed to remove partial remux output"
                    );
                }
            }
            return Err(e.into());
        }

        if !tokio::fs::try_exists(&output).await? {
            return Err(FastStartError::MissingOutput(output));
        }

        tracing::debug!(output = %output.display(), "Remuxed to fast start");
        Ok(output)
    }
}
