//! Error taxonomy shared across the pipeline.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Coarse failure category every crate error maps onto.
///
/// The batch driver reports failures by kind; all kinds are isolated
/// to the job that raised them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or insufficient job data
    Validation,
    /// Expected audio or frame file absent
    MissingAsset,
    /// External encoder failure, timeout, or implausible output
    Encoding,
    /// Queue or output directory unreadable/unwritable
    Io,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::MissingAsset => "missing_asset",
            ErrorKind::Encoding => "encoding",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `EXDEV` on Linux and macOS: a rename crossed filesystems.
pub const EXDEV: i32 = 18;

/// Whether a failed rename should fall back to copy + remove.
pub fn is_cross_device(e: &std::io::Error) -> bool {
    e.raw_os_error() == Some(EXDEV)
}

/// Errors raised while building or checking model values.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid job: {0}")]
    Validation(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Validation
    }
}

impl From<validator::ValidationErrors> for ModelError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_device_detection() {
        assert!(is_cross_device(&std::io::Error::from_raw_os_error(EXDEV)));
        assert!(!is_cross_device(&std::io::Error::from_raw_os_error(2)));
        assert!(!is_cross_device(&std::io::Error::other("custom")));
    }
}
