use crate::keys::validate_storage_key;
use crate::traits::{ByteReader, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Bucket name reported by the filesystem backend.
pub const LOCAL_BUCKET: &str = "local";

/// Local filesystem storage implementation
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for file storage (e.g., "/var/lib/clipvault/media")
    /// * `base_url` - Base URL for serving files (e.g., "http://localhost:8091/assets")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Map a key to a path under the root, refusing anything that escapes it.
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        validate_storage_key(storage_key)?;

        let path = self.base_path.join(storage_key);
        if !path.starts_with(&self.base_path) {
            return Err(StorageError::InvalidKey(
                "Storage key resolves outside storage directory".to_string(),
            ));
        }

        Ok(path)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write to a sibling temp name, then rename into place, so readers never
    /// observe a half-written object.
    async fn write_atomically(
        &self,
        path: &Path,
        mut reader: ByteReader,
    ) -> StorageResult<u64> {
        let partial = path.with_extension("partial");

        let result: StorageResult<u64> = async {
            let mut file = fs::File::create(&partial).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to create file {}: {}",
                    partial.display(),
                    e
                ))
            })?;
            let written = tokio::io::copy(&mut reader, &mut file).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    partial.display(),
                    e
                ))
            })?;
            file.sync_all().await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to sync file {}: {}",
                    partial.display(),
                    e
                ))
            })?;
            fs::rename(&partial, path).await.map_err(|e| {
                StorageError::UploadFailed(format!(
                    "Failed to move file into {}: {}",
                    path.display(),
                    e
                ))
            })?;
            Ok(written)
        }
        .await;

        if result.is_err() {
            let _ = fs::remove_file(&partial).await;
        }
        result
    }
}

#[async_trait]
impl Storage for LocalStorage {
    fn bucket(&self) -> &str {
        LOCAL_BUCKET
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::Local
    }

    fn public_url(&self, storage_key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), storage_key)
    }

    async fn put_stream(
        &self,
        storage_key: &str,
        reader: ByteReader,
        content_length: Option<u64>,
        _content_type: &str,
    ) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();
        let written = self.write_atomically(&path, reader).await?;

        if let Some(expected) = content_length {
            if expected != written {
                let _ = fs::remove_file(&path).await;
                return Err(StorageError::UploadFailed(format!(
                    "Stream ended after {} bytes, expected {}",
                    written, expected
                )));
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = written,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(())
    }

    async fn put_bytes(
        &self,
        storage_key: &str,
        data: Bytes,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.key_to_path(storage_key)?;
        let size = data.len();

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let mut file = fs::File::create(&path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        file.write_all(&data).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to write file {}: {}", path.display(), e))
        })?;

        file.sync_all().await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to sync file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage put_bytes successful"
        );

        Ok(self.public_url(storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        let path = self.key_to_path(storage_key)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        let path = self.key_to_path(storage_key)?;
        Ok(fs::try_exists(&path).await?)
    }

    /// Files on disk are served unsigned; the "presigned" URL is the public one.
    async fn presign_get(
        &self,
        bucket: &str,
        storage_key: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        if bucket != LOCAL_BUCKET {
            return Err(StorageError::InvalidReference(format!(
                "Reference points at bucket '{}', this store serves '{}'",
                bucket, LOCAL_BUCKET
            )));
        }
        self.key_to_path(storage_key)?;
        Ok(self.public_url(storage_key))
    }
}
