//! Clipvault Storage Library
//!
//! Storage abstraction for uploaded videos, with implementations for S3 (via
//! `object_store`) and the local filesystem.
//!
//! # Storage key format
//!
//! Video keys are namespaced by orientation: `<orientation>/<uuid>.mp4`
//! (see `clipvault_core::models::StoredAsset`). Keys must not contain `..` or a
//! leading `/`.
//!
//! # References
//!
//! [`ReferenceResolver`] decides what gets written into a video record once an
//! upload lands, and turns that value back into a playable URL on read.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod reference;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use clipvault_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
pub use reference::{ReferencePolicy, ReferenceResolver, ReferenceToken};
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{ByteReader, Storage, StorageError, StorageResult};
