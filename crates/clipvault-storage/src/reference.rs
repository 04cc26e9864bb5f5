//! Reference Resolver
//!
//! Decides the value persisted in a video record's `video_url` once the object
//! has landed, and turns that value into something playable when the record is
//! read back.
//!
//! Two deployment policies exist, selected once from configuration:
//!
//! - **Direct**: the persisted value is already a URL (CDN prefix + key, or the
//!   store's own public URL). Reads return it untouched.
//! - **Signed**: the persisted value is a `bucket,key` token. Reads exchange it
//!   for a presigned GET URL that expires after the configured TTL. The signed
//!   form is only ever placed in responses, never written back.

use crate::traits::{Storage, StorageError, StorageResult};
use clipvault_core::{Config, ReferenceMode};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;
use std::time::Duration;

/// Composite `bucket,key` reference stored for deferred signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken {
    pub bucket: String,
    pub key: String,
}

impl ReferenceToken {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse a stored value. Anything that is not exactly two non-empty
    /// comma-separated parts, or that looks like a URL, is not a token.
    pub fn parse(stored: &str) -> Option<Self> {
        if stored.contains("://") {
            return None;
        }
        let (bucket, key) = stored.split_once(',')?;
        if bucket.is_empty() || key.is_empty() || key.contains(',') {
            return None;
        }
        Some(Self::new(bucket, key))
    }
}

impl Display for ReferenceToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{},{}", self.bucket, self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferencePolicy {
    Direct { cdn_base_url: Option<String> },
    Signed { ttl: Duration },
}

impl ReferencePolicy {
    pub fn from_config(config: &Config) -> Self {
        match config.video_reference_mode() {
            ReferenceMode::Direct => ReferencePolicy::Direct {
                cdn_base_url: config.cdn_base_url().map(String::from),
            },
            ReferenceMode::Signed => ReferencePolicy::Signed {
                ttl: Duration::from_secs(config.presign_ttl_secs()),
            },
        }
    }
}

#[derive(Clone)]
pub struct ReferenceResolver {
    storage: Arc<dyn Storage>,
    policy: ReferencePolicy,
}

impl ReferenceResolver {
    pub fn new(storage: Arc<dyn Storage>, policy: ReferencePolicy) -> Self {
        Self { storage, policy }
    }

    pub fn policy(&self) -> &ReferencePolicy {
        &self.policy
    }

    /// Value to persist for an object just written at `storage_key`.
    pub fn reference_for(&self, storage_key: &str) -> String {
        match &self.policy {
            ReferencePolicy::Signed { .. } => {
                ReferenceToken::new(self.storage.bucket(), storage_key).to_string()
            }
            ReferencePolicy::Direct {
                cdn_base_url: Some(base),
            } => format!("{}/{}", base.trim_end_matches('/'), storage_key),
            ReferencePolicy::Direct { cdn_base_url: None } => self.storage.public_url(storage_key),
        }
    }

    /// Turn a persisted value into a playable URL.
    ///
    /// In signed mode, values that are not tokens (records written under the
    /// direct policy) pass through unchanged.
    pub async fn resolve(&self, stored: &str) -> StorageResult<String> {
        let ttl = match &self.policy {
            ReferencePolicy::Direct { .. } => return Ok(stored.to_string()),
            ReferencePolicy::Signed { ttl } => *ttl,
        };

        let Some(token) = ReferenceToken::parse(stored) else {
            return Ok(stored.to_string());
        };

        self.storage
            .presign_get(&token.bucket, &token.key, ttl)
            .await
            .map_err(|e| match e {
                StorageError::InvalidReference(_) | StorageError::InvalidKey(_) => e,
                other => StorageError::BackendError(format!(
                    "Failed to sign reference {}: {}",
                    token, other
                )),
            })
    }

    /// Resolve an optional field, as carried by `VideoRecord::video_url`.
    pub async fn resolve_optional(&self, stored: Option<&str>) -> StorageResult<Option<String>> {
        match stored {
            Some(value) => self.resolve(value).await.map(Some),
            None => Ok(None),
        }
    }
}
