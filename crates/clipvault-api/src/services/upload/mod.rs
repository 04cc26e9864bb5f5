//! Video upload pipeline
//!
//! Staging lives in [`staging`]; the stage sequence from authorization to the
//! record write lives in [`orchestrator`].

pub mod orchestrator;
pub mod staging;

pub use orchestrator::{UploadSession, UploadStage, VideoUploadPipeline};
pub use staging::{StagedUpload, StagingArea, StagingError};
