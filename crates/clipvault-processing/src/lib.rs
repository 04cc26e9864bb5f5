//! Clipvault media processing
//!
//! Wraps the two external tools the upload pipeline depends on:
//!
//! - [`MediaProber`] runs `ffprobe` and reads the geometry of the first video
//!   stream.
//! - [`FastStartNormalizer`] runs `ffmpeg` in stream-copy mode to move the
//!   `moov` atom to the front of an MP4, writing `<input>.processing`.
//!
//! Both go through [`ToolCommand`], which captures output, checks the exit
//! status and enforces a timeout. The child is killed if the calling future is
//! dropped.

pub mod command;
pub mod error;
pub mod faststart;
pub mod probe;

pub use command::{ToolCommand, ToolError, ToolOutput};
pub use error::{FastStartError, ProbeError};
pub use faststart::{processing_path, FastStartNormalizer, FastStartRemuxer};
pub use probe::{select_dimensions, MediaProber, ProbeOutput, ProbeReport, ProbeStream, StreamProber};
