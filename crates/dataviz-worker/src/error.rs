//! Worker error types.

use thiserror::Error;

use dataviz_models::{ErrorKind, ModelError};

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid job: {0}")]
    Validation(String),

    #[error("Data source failed: {0}")]
    DataSource(String),

    #[error("Narration failed: {0}")]
    Narration(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Render task failed: {0}")]
    TaskFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] dataviz_media::MediaError),

    #[error("Queue error: {0}")]
    Queue(#[from] dataviz_queue::QueueError),

    #[error("Storage error: {0}")]
    Storage(#[from] dataviz_storage::StorageError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn data_source(msg: impl Into<String>) -> Self {
        Self::DataSource(msg.into())
    }

    pub fn narration(msg: impl Into<String>) -> Self {
        Self::Narration(msg.into())
    }

    pub fn synthesis(msg: impl Into<String>) -> Self {
        Self::Synthesis(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Failure category used in batch reports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkerError::Validation(_) | WorkerError::ConfigError(_) => ErrorKind::Validation,
            WorkerError::Media(e) => e.kind(),
            WorkerError::Queue(e) => e.kind(),
            WorkerError::Storage(e) => e.kind(),
            WorkerError::DataSource(_)
            | WorkerError::Narration(_)
            | WorkerError::Synthesis(_)
            | WorkerError::TaskFailed(_)
            | WorkerError::Http(_)
            | WorkerError::Io(_) => ErrorKind::Io,
        }
    }
}

impl From<ModelError> for WorkerError {
    fn from(err: ModelError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::TaskFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataviz_media::MediaError;

    #[test]
    fn test_kind_passes_through_layers() {
        let err: WorkerError = MediaError::Timeout(600).into();
        assert_eq!(err.kind(), ErrorKind::Encoding);

        let err: WorkerError = MediaError::missing_asset("outputs/voiceover_1.mp3").into();
        assert_eq!(err.kind(), ErrorKind::MissingAsset);

        let err: WorkerError = ModelError::validation("too short").into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
