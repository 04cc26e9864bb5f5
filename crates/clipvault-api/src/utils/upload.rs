//! Common utilities for upload handlers

use crate::constants::{THUMBNAIL_CONTENT_TYPES, VIDEO_CONTENT_TYPE};
use axum::http::{header::CONTENT_TYPE, HeaderMap};
use clipvault_core::AppError;
use uuid::Uuid;

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Normalize MIME type by stripping parameters (e.g. "video/mp4; codecs=avc1" -> "video/mp4").
pub fn normalize_mime_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
}

/// Exact match against `video/mp4` once parameters are stripped.
pub fn is_video_content_type(content_type: &str) -> bool {
    normalize_mime_type(content_type) == VIDEO_CONTENT_TYPE
}

/// File extension for an accepted thumbnail type (`jpeg` or `png`).
pub fn thumbnail_extension(content_type: &str) -> Option<&'static str> {
    let normalized = normalize_mime_type(content_type);
    THUMBNAIL_CONTENT_TYPES
        .iter()
        .find(|allowed| **allowed == normalized)
        .and_then(|allowed| allowed.strip_prefix("image/"))
}

pub fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| normalize_mime_type(ct).eq_ignore_ascii_case(MULTIPART_FORM_DATA))
        .unwrap_or(false)
}

pub fn header_content_type(headers: &HeaderMap) -> Option<&str> {
    headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
}

/// Parse a video id from a path segment.
pub fn parse_video_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::InvalidInput(format!("Invalid video ID: {}", raw)))
}
