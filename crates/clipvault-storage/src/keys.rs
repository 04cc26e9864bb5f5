//! Shared storage key checks for all backends.

use crate::traits::{StorageError, StorageResult};

/// Reject keys that could escape the bucket root or that no backend can address.
pub fn validate_storage_key(storage_key: &str) -> StorageResult<()> {
    if storage_key.is_empty() {
        return Err(StorageError::InvalidKey(
            "Storage key must not be empty".to_string(),
        ));
    }

    if storage_key.contains("..") || storage_key.starts_with('/') || storage_key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }

    if storage_key.contains(',') {
        // Commas separate bucket and key in stored reference tokens.
        return Err(StorageError::InvalidKey(
            "Storage key must not contain ','".to_string(),
        ));
    }

    Ok(())
}
