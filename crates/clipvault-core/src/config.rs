//! Configuration module
//!
//! Configuration is read once at startup (`Config::from_env`) and passed into
//! the services that need it; nothing reads process-wide settings afterwards.

use std::env;
use std::path::PathBuf;

use crate::storage_types::{ReferenceMode, StorageBackend, UnclassifiedPolicy};

// Common constants
const SERVER_PORT: u16 = 8091;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 24;
const MAX_VIDEO_SIZE_BYTES: u64 = 1 << 30;
const MAX_THUMBNAIL_SIZE_BYTES: u64 = 10 << 20;
const MEDIA_TOOL_TIMEOUT_SECS: u64 = 300;
const PRESIGN_TTL_SECS: u64 = 300;

/// Server-level settings
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub environment: String,
}

/// Video hosting configuration
#[derive(Clone, Debug)]
pub struct VaultConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Thumbnails
    pub assets_root: PathBuf,
    pub public_base_url: String,
    pub max_thumbnail_size_bytes: u64,
    // Video ingestion
    pub max_video_size_bytes: u64,
    pub upload_staging_dir: Option<PathBuf>,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
    pub media_tool_timeout_secs: u64,
    pub unclassified_orientation: UnclassifiedPolicy,
    // Playback references
    pub video_reference_mode: ReferenceMode,
    pub cdn_base_url: Option<String>,
    pub presign_ttl_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<VaultConfig>);

impl Config {
    fn as_vault(&self) -> &VaultConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.as_vault().base.environment)
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = VaultConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.as_vault().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.as_vault().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.as_vault().base.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.as_vault().base.environment
    }

    pub fn db_max_connections(&self) -> u32 {
        self.as_vault().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.as_vault().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.as_vault().base.jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.as_vault().base.jwt_expiry_hours
    }

    pub fn database_url(&self) -> &str {
        &self.as_vault().database_url
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.as_vault().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.as_vault().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.as_vault().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.as_vault().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.as_vault().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.as_vault().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.as_vault().local_storage_base_url.as_deref()
    }

    pub fn assets_root(&self) -> &std::path::Path {
        &self.as_vault().assets_root
    }

    pub fn public_base_url(&self) -> &str {
        &self.as_vault().public_base_url
    }

    pub fn max_thumbnail_size_bytes(&self) -> u64 {
        self.as_vault().max_thumbnail_size_bytes
    }

    pub fn max_video_size_bytes(&self) -> u64 {
        self.as_vault().max_video_size_bytes
    }

    pub fn upload_staging_dir(&self) -> Option<&std::path::Path> {
        self.as_vault().upload_staging_dir.as_deref()
    }

    pub fn ffprobe_path(&self) -> &str {
        &self.as_vault().ffprobe_path
    }

    pub fn ffmpeg_path(&self) -> &str {
        &self.as_vault().ffmpeg_path
    }

    pub fn media_tool_timeout_secs(&self) -> u64 {
        self.as_vault().media_tool_timeout_secs
    }

    pub fn unclassified_orientation(&self) -> UnclassifiedPolicy {
        self.as_vault().unclassified_orientation
    }

    pub fn video_reference_mode(&self) -> ReferenceMode {
        self.as_vault().video_reference_mode
    }

    pub fn cdn_base_url(&self) -> Option<&str> {
        self.as_vault().cdn_base_url.as_deref()
    }

    pub fn presign_ttl_secs(&self) -> u64 {
        self.as_vault().presign_ttl_secs
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

impl VaultConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port: u16 = env::var("PORT")
            .unwrap_or_else(|_| SERVER_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let base = BaseConfig {
            server_port,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| JWT_EXPIRY_HOURS.to_string())
                .parse()
                .unwrap_or(JWT_EXPIRY_HOURS),
            environment,
        };

        let storage_backend = match optional_var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::S3,
        };

        let video_reference_mode = match optional_var("VIDEO_REFERENCE_MODE") {
            Some(value) => value.parse()?,
            None => ReferenceMode::Signed,
        };

        let unclassified_orientation = match optional_var("UNCLASSIFIED_ORIENTATION") {
            Some(value) => value.parse()?,
            None => UnclassifiedPolicy::default(),
        };

        let config = VaultConfig {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            storage_backend,
            s3_bucket: optional_var("S3_BUCKET"),
            s3_region: optional_var("S3_REGION"),
            s3_endpoint: optional_var("S3_ENDPOINT"),
            aws_region: optional_var("AWS_REGION"),
            local_storage_path: optional_var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: optional_var("LOCAL_STORAGE_BASE_URL"),
            assets_root: PathBuf::from(
                env::var("ASSETS_ROOT").unwrap_or_else(|_| "./assets".to_string()),
            ),
            public_base_url: optional_var("PUBLIC_BASE_URL")
                .unwrap_or_else(|| format!("http://localhost:{}", server_port)),
            max_thumbnail_size_bytes: env::var("MAX_THUMBNAIL_SIZE_BYTES")
                .unwrap_or_else(|_| MAX_THUMBNAIL_SIZE_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_THUMBNAIL_SIZE_BYTES),
            max_video_size_bytes: env::var("MAX_VIDEO_SIZE_BYTES")
                .unwrap_or_else(|_| MAX_VIDEO_SIZE_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_VIDEO_SIZE_BYTES),
            upload_staging_dir: optional_var("UPLOAD_STAGING_DIR").map(PathBuf::from),
            ffprobe_path: env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or_else(|_| "ffmpeg".to_string()),
            media_tool_timeout_secs: env::var("MEDIA_TOOL_TIMEOUT_SECS")
                .unwrap_or_else(|_| MEDIA_TOOL_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(MEDIA_TOOL_TIMEOUT_SECS),
            unclassified_orientation,
            video_reference_mode,
            cdn_base_url: optional_var("CDN_BASE_URL"),
            presign_ttl_secs: env::var("PRESIGN_TTL_SECS")
                .unwrap_or_else(|_| PRESIGN_TTL_SECS.to_string())
                .parse()
                .unwrap_or(PRESIGN_TTL_SECS),
            base,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.max_video_size_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MAX_VIDEO_SIZE_BYTES must be greater than zero"
            ));
        }

        if self.media_tool_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "MEDIA_TOOL_TIMEOUT_SECS must be greater than zero"
            ));
        }

        if self.video_reference_mode == ReferenceMode::Signed && self.presign_ttl_secs == 0 {
            return Err(anyhow::anyhow!(
                "PRESIGN_TTL_SECS must be greater than zero in signed reference mode"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        Ok(())
    }
}
