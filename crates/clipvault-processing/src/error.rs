use crate::command::ToolError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Probe tool failed: {0}")]
    Tool(#[from] ToolError),

    #[error("Unreadable probe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Probe output lists no streams")]
    NoStreams,

    #[error("None of {count} streams has a positive width and height")]
    NoVideoStream { count: usize },
}

#[derive(Debug, Error)]
pub enum FastStartError {
    #[error("Remux tool failed: {0}")]
    Tool(#[from] ToolError),

    #[error("Remux tool produced no output at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("I/O error around remux: {0}")]
    Io(#[from] std::io::Error),
}
