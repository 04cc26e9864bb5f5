//! Media Prober: stream geometry via `ffprobe`.

use crate::command::ToolCommand;
use crate::error::ProbeError;
use async_trait::async_trait;
use clipvault_core::models::{AspectRatio, Dimensions};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// `ffprobe -print_format json -show_streams` output.
///
/// Only the fields read here are modelled. `streams` is mandatory; streams
/// without geometry (audio, data) carry no `width`/`height`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeOutput {
    pub streams: Vec<ProbeStream>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeStream {
    #[serde(default)]
    pub codec_type: Option<String>,
    #[serde(default)]
    pub width: Option<i64>,
    #[serde(default)]
    pub height: Option<i64>,
}

impl ProbeOutput {
    pub fn from_json(stdout: &[u8]) -> Result<Self, ProbeError> {
        Ok(serde_json::from_slice(stdout)?)
    }
}

/// Geometry of the selected stream and its canonical ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeReport {
    pub dimensions: Dimensions,
    pub aspect_ratio: AspectRatio,
}

impl ProbeReport {
    pub fn from_dimensions(dimensions: Dimensions) -> Self {
        Self {
            dimensions,
            aspect_ratio: AspectRatio::classify(dimensions),
        }
    }
}

/// First stream, in order, whose width and height are both strictly positive.
///
/// A missing, zero, negative or out-of-range side means the stream carries no
/// picture, so it is skipped.
pub fn select_dimensions(output: &ProbeOutput) -> Result<Dimensions, ProbeError> {
    if output.streams.is_empty() {
        return Err(ProbeError::NoStreams);
    }

    for stream in &output.streams {
        let width = stream.width.and_then(|w| u32::try_from(w).ok());
        let height = stream.height.and_then(|h| u32::try_from(h).ok());

        if let Some(dimensions) = width.zip(height).and_then(|(w, h)| Dimensions::new(w, h)) {
            return Ok(dimensions);
        }
    }

    Err(ProbeError::NoVideoStream {
        count: output.streams.len(),
    })
}

#[async_trait]
pub trait StreamProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<ProbeReport, ProbeError>;
}

/// `ffprobe` backed [`StreamProber`].
#[derive(Debug, Clone)]
pub struct MediaProber {
    ffprobe_path: String,
    timeout: Duration,
}

impl MediaProber {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            timeout,
        }
    }

    fn command(&self, path: &Path) -> ToolCommand {
        ToolCommand::new(self.ffprobe_path.clone(), self.timeout)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
    }
}

#[async_trait]
impl StreamProber for MediaProber {
    #[tracing::instrument(skip(self), fields(path = %path.display()))]
    async fn probe(&self, path: &Path) -> Result<ProbeReport, ProbeError> {
        let output = self.command(path).run().await?;
        let parsed = ProbeOutput::from_json(&output.stdout)?;
        let dimensions = select_dimensions(&parsed)?;
        let report = ProbeReport::from_dimensions(dimensions);

        tracing::debug!(
            dimensions = %report.dimensions,
            aspect_ratio = %report.aspect_ratio,
            streams = parsed.streams.len(),
            "Probed media file"
        );

        Ok(report)
    }
}
