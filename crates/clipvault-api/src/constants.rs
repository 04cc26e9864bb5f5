//! API constants

/// API base path prefix
pub const API_PREFIX: &str = "/api";

/// Static thumbnail route
pub const ASSETS_ROUTE: &str = "/assets";

/// Multipart field carrying the video file
pub const VIDEO_FIELD: &str = "video";

/// Multipart field carrying the thumbnail image
pub const THUMBNAIL_FIELD: &str = "thumbnail";

/// The only accepted video media type (compared after stripping parameters)
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Accepted thumbnail media types
pub const THUMBNAIL_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Headroom over a file cap for multipart boundaries and part headers.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;
