use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Defined in core because it's used by configuration and by the storage factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    S3,
    Local,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "s3" => Ok(StorageBackend::S3),
            "local" => Ok(StorageBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Local => write!(f, "local"),
        }
    }
}

/// How a video's stored reference is written and later served.
///
/// - `Signed`: the record keeps a `bucket,key` token and every read exchanges it
///   for a time-limited presigned URL.
/// - `Direct`: the record keeps an immediately usable URL (CDN prefix or the
///   store's public URL); reads return it untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceMode {
    Signed,
    Direct,
}

impl FromStr for ReferenceMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "signed" | "presigned" => Ok(ReferenceMode::Signed),
            "direct" | "cdn" => Ok(ReferenceMode::Direct),
            _ => Err(anyhow::anyhow!("Invalid video reference mode: {}", s)),
        }
    }
}

impl Display for ReferenceMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ReferenceMode::Signed => write!(f, "signed"),
            ReferenceMode::Direct => write!(f, "direct"),
        }
    }
}

/// Where videos whose aspect ratio is neither 16:9 nor 9:16 are filed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnclassifiedPolicy {
    /// Fold them into the `portrait/` namespace.
    #[default]
    Portrait,
    /// Give them their own `other/` namespace.
    Other,
}

impl FromStr for UnclassifiedPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "portrait" => Ok(UnclassifiedPolicy::Portrait),
            "other" => Ok(UnclassifiedPolicy::Other),
            _ => Err(anyhow::anyhow!("Invalid unclassified orientation policy: {}", s)),
        }
    }
}
