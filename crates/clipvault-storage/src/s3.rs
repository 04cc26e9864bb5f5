use crate::keys::validate_storage_key;
use crate::traits::{ByteReader, Storage, StorageError, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{
    Attribute, AttributeValue, Attributes, ObjectStore, ObjectStoreExt, PutMultipartOptions,
    PutOptions, PutPayload, PutPayloadMut, Result as ObjectResult, WriteMultipart,
};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;

/// Multipart part size. Streams no longer than one part go up as a single PUT.
const PART_SIZE_BYTES: usize = 8 * 1024 * 1024;
/// Parts uploading at once; with the part being filled this bounds the memory
/// one upload holds to `(MAX_PARTS_IN_FLIGHT + 1) * PART_SIZE_BYTES`.
const MAX_PARTS_IN_FLIGHT: usize = 4;
const READ_BUFFER_BYTES: usize = 256 * 1024;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    region: String,
    endpoint_url: Option<String>, // Custom endpoint for S3-compatible providers
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    ///
    /// Credentials come from the standard `AWS_*` environment variables.
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
    ) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            region,
            endpoint_url,
        })
    }

    fn content_type_attributes(content_type: &str) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );
        attributes
    }

    fn put_options(content_type: &str) -> PutOptions {
        PutOptions {
            attributes: Self::content_type_attributes(content_type),
            ..Default::default()
        }
    }

    /// Stream `reader` as a multipart upload, aborting it on any failure.
    async fn put_multipart_stream(
        &self,
        storage_key: &str,
        mut reader: ByteReader,
        content_length: Option<u64>,
        content_type: &str,
    ) -> StorageResult<u64> {
        let location = Path::from(storage_key.to_string());
        let start = Instant::now();
        let opts = PutMultipartOptions {
            attributes: Self::content_type_attributes(content_type),
            ..Default::default()
        };

        let upload = self
            .store
            .put_multipart_opts(&location, opts)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        let mut writer = WriteMultipart::new_with_chunk_size(upload, PART_SIZE_BYTES);

        let total = match feed_parts(&mut writer, &mut reader, content_length).await {
            Ok(total) => total,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(
                        error = %abort_err,
                        bucket = %self.bucket,
                        key = %storage_key,
                        "Failed to abort multipart upload"
                    );
                }
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 multipart upload failed"
                );
                return Err(e);
            }
        };

        writer.finish().await.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = total,
                "S3 multipart completion failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = total,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 multipart upload successful"
        );
        Ok(total)
    }

    async fn put_payload(
        &self,
        storage_key: &str,
        payload: PutPayload,
        content_type: &str,
    ) -> StorageResult<u64> {
        let size = payload.content_length() as u64;
        let location = Path::from(storage_key.to_string());
        let start = Instant::now();

        let result: ObjectResult<_> = self
            .store
            .put_opts(&location, payload, Self::put_options(content_type))
            .await;

        result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %storage_key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3 upload failed"
            );
            StorageError::UploadFailed(e.to_string())
        })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            content_type = %content_type,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );

        Ok(size)
    }
}

fn read_failed(e: std::io::Error) -> StorageError {
    StorageError::UploadFailed(format!("Failed to read from stream: {}", e))
}

fn check_length(expected: Option<u64>, total: u64) -> StorageResult<()> {
    match expected {
        Some(expected) if expected != total => Err(StorageError::UploadFailed(format!(
            "Stream ended after {} bytes, expected {}",
            total, expected
        ))),
        _ => Ok(()),
    }
}

/// Read a stream known to fit in one part.
async fn read_small(reader: &mut ByteReader, content_length: Option<u64>) -> StorageResult<PutPayload> {
    let mut payload = PutPayloadMut::new();
    let mut buf = vec![0u8; READ_BUFFER_BYTES];
    let mut total: u64 = 0;
    loop {
        let n = reader.read(&mut buf).await.map_err(read_failed)?;
        if n == 0 {
            break;
        }
        total += n as u64;
        if total > PART_SIZE_BYTES as u64 {
            return Err(StorageError::UploadFailed(format!(
                "Stream exceeds declared length {:?}",
                content_length
            )));
        }
        payload.extend_from_slice(&buf[..n]);
    }
    check_length(content_length, total)?;
    Ok(payload.freeze())
}

/// Copy `reader` into `writer`, waiting for a free part slot before each write.
async fn feed_parts(
    writer: &mut WriteMultipart,
    reader: &mut ByteReader,
    content_length: Option<u64>,
) -> StorageResult<u64> {
    let mut buf = vec![0u8; READ_BUFFER_BYTES];
    let mut total: u64 = 0;
    loop {
        let n = reader.read(&mut buf).await.map_err(read_failed)?;
        if n == 0 {
            break;
        }
        writer
            .wait_for_capacity(MAX_PARTS_IN_FLIGHT)
            .await
            .map_err(|e| StorageError::UploadFailed(e.to_string()))?;
        writer.write(&buf[..n]);
        total += n as u64;
    }
    check_length(content_length, total)?;
    Ok(total)
}

/// Public URL for an object.
///
/// For AWS S3: `https://{bucket}.s3.{region}.amazonaws.com/{key}`.
/// For S3-compatible providers, path-style under the endpoint: `{endpoint}/{bucket}/{key}`.
fn object_url(endpoint_url: Option<&str>, bucket: &str, region: &str, key: &str) -> String {
    match endpoint_url {
        Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), bucket, key),
        None => format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key),
    }
}

#[async_trait]
impl Storage for S3Storage {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }

    fn public_url(&self, storage_key: &str) -> String {
        object_url(
            self.endpoint_url.as_deref(),
            &self.bucket,
            &self.region,
            storage_key,
        )
    }

    async fn put_stream(
        &self,
        storage_key: &str,
        mut reader: ByteReader,
        content_length: Option<u64>,
        content_type: &str,
    ) -> StorageResult<()> {
        validate_storage_key(storage_key)?;

        if content_length.is_some_and(|len| len <= PART_SIZE_BYTES as u64) {
            let payload = read_small(&mut reader, content_length).await?;
            self.put_payload(storage_key, payload, content_type).await?;
        } else {
            self.put_multipart_stream(storage_key, reader, content_length, content_type)
                .await?;
        }
        Ok(())
    }

    async fn put_bytes(
        &self,
        storage_key: &str,
        data: Bytes,
        content_type: &str,
    ) -> StorageResult<String> {
        validate_storage_key(storage_key)?;
        self.put_payload(storage_key, PutPayload::from(data), content_type)
            .await?;
        Ok(self.public_url(storage_key))
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        validate_storage_key(storage_key)?;
        let start = Instant::now();
        let location = Path::from(storage_key.to_string());

        let result: ObjectResult<_> = self.store.delete(&location).await;

        match result {
            Ok(_) | Err(ObjectStoreError::NotFound { .. }) => {}
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                return Err(StorageError::DeleteFailed(e.to_string()));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );

        Ok(())
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        validate_storage_key(storage_key)?;
        let location = Path::from(storage_key.to_string());
        match self.store.head(&location).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::BackendError(e.to_string())),
        }
    }

    async fn presign_get(
        &self,
        bucket: &str,
        storage_key: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        if bucket != self.bucket {
            return Err(StorageError::InvalidReference(format!(
                "Reference points at bucket '{}', this store serves '{}'",
                bucket, self.bucket
            )));
        }
        validate_storage_key(storage_key)?;

        let location = Path::from(storage_key.to_string());
        let url_result: ObjectResult<_> = self
            .store
            .signed_url(Method::GET, &location, expires_in)
            .await;

        let url = url_result
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .to_string();

        tracing::debug!(
            bucket = %self.bucket,
            key = %storage_key,
            expires_in_secs = expires_in.as_secs(),
            "Generated presigned GET URL"
        );

        Ok(url)
    }
}
