//! Queue error types.

use std::path::PathBuf;
use thiserror::Error;

use dataviz_models::ErrorKind;

pub type QueueResult<T> = Result<T, QueueError>;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue directory {path} is not writable: {source}")]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed job file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid job: {0}")]
    InvalidJob(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl QueueError {
    pub fn unwritable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unwritable {
            path: path.into(),
            source,
        }
    }

    pub fn unreadable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// File the error refers to, when known.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            QueueError::Unwritable { path, .. }
            | QueueError::Unreadable { path, .. }
            | QueueError::Malformed { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::Malformed { .. } | QueueError::InvalidJob(_) | QueueError::Json(_) => {
                ErrorKind::Validation
            }
            QueueError::Unwritable { .. } | QueueError::Unreadable { .. } | QueueError::Io(_) => {
                ErrorKind::Io
            }
        }
    }
}
