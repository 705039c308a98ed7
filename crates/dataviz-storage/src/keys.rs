//! Object key layout.

use std::path::Path;

use crate::error::{StorageError, StorageResult};

/// Bucket used when `R2_BUCKET_NAME` is unset.
pub const DEFAULT_BUCKET: &str = "video-renders";

/// Prefix under which finished videos are published.
pub const RENDERS_PREFIX: &str = "renders/";

/// `renders/<file name>` for a local output file.
pub fn render_key(path: &Path) -> StorageResult<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| StorageError::InvalidKey(path.display().to_string()))?;
    Ok(format!("{}{}", RENDERS_PREFIX, name))
}

/// Content type by file extension.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("json") => "application/json",
        Some("png") => "image/png",
        _ => "application/octet-stream",
    }
}
