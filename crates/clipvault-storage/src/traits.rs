//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Readable byte source handed to [`Storage::put_stream`].
pub type ByteReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Storage abstraction trait
///
/// Every backend is bound to a single bucket (or root directory). Objects are
/// addressed by key inside it.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Bucket (or namespace) this store writes into.
    fn bucket(&self) -> &str;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;

    /// Unsigned public URL for a key. Only meaningful when the bucket is public
    /// or fronted by a server.
    fn public_url(&self, storage_key: &str) -> String;

    /// Transfer the full content of `reader` to `storage_key`.
    ///
    /// The reader is consumed until EOF. Any transport or store-side rejection
    /// is returned as `StorageError::UploadFailed`.
    async fn put_stream(
        &self,
        storage_key: &str,
        reader: ByteReader,
        content_length: Option<u64>,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Store an in-memory object and return its public URL.
    async fn put_bytes(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String>;

    /// Delete an object. Deleting a missing key is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if an object exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Generate a presigned GET URL valid for `expires_in`.
    ///
    /// `bucket` must name this store's bucket; references minted by another
    /// deployment are rejected with `InvalidReference`.
    async fn presign_get(
        &self,
        bucket: &str,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;
}
