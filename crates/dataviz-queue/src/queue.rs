//! Job queue backed by a directory of JSON files.

use futures_util::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs::{self, ReadDir};
use tracing::{debug, info, warn};

use dataviz_models::{is_cross_device, RenderJob};

use crate::error::{QueueError, QueueResult};
use crate::job_file::{is_job_file, job_file_name, load_job, PendingJob};

/// Default queue location, relative to the working directory.
pub const DEFAULT_QUEUE_DIR: &str = "data/render_queue";

/// Subdirectory receiving archived jobs when no archive dir is configured.
pub const DEFAULT_ARCHIVE_SUBDIR: &str = "processed";

/// What happens to a job file after its video has been rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionPolicy {
    /// Move into the archive directory
    #[default]
    Archive,
    /// Remove the file
    Delete,
    /// Keep it in place; the next scan renders it again
    Leave,
}

impl CompletionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionPolicy::Archive => "archive",
            CompletionPolicy::Delete => "delete",
            CompletionPolicy::Leave => "leave",
        }
    }
}

impl fmt::Display for CompletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompletionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "archive" => Ok(CompletionPolicy::Archive),
            "delete" => Ok(CompletionPolicy::Delete),
            "leave" => Ok(CompletionPolicy::Leave),
            other => Err(format!("unknown completion policy: {}", other)),
        }
    }
}

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Directory holding pending job files
    pub dir: PathBuf,
    /// Where archived jobs go (defaults to `<dir>/processed`)
    pub archive_dir: Option<PathBuf>,
    /// Bookkeeping after a successful render
    pub completion: CompletionPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_QUEUE_DIR),
            archive_dir: None,
            completion: CompletionPolicy::default(),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let completion = match std::env::var("QUEUE_COMPLETION") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, using archive", e);
                CompletionPolicy::Archive
            }),
            Err(_) => CompletionPolicy::Archive,
        };

        Self {
            dir: std::env::var("QUEUE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_QUEUE_DIR)),
            archive_dir: std::env::var("QUEUE_ARCHIVE_DIR").ok().map(PathBuf::from),
            completion,
        }
    }

    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn with_completion(mut self, completion: CompletionPolicy) -> Self {
        self.completion = completion;
        self
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.archive_dir
            .clone()
            .unwrap_or_else(|| self.dir.join(DEFAULT_ARCHIVE_SUBDIR))
    }
}

/// Outcome of [`JobQueue::complete`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Archived(PathBuf),
    Deleted,
    Left,
}

/// Directory-backed job queue.
#[derive(Debug, Clone)]
pub struct JobQueue {
    config: QueueConfig,
}

enum ScanState {
    Start(PathBuf),
    Reading(PathBuf, ReadDir),
    Done,
}

impl JobQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self { config }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(QueueConfig::from_env())
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    /// Path a job with this id is stored at.
    pub fn job_path(&self, job: &RenderJob) -> PathBuf {
        self.config.dir.join(job_file_name(&job.id))
    }

    /// Persist a job as `video_<id>.json`.
    ///
    /// The file is written under a temporary name and renamed, so a
    /// concurrent scan never sees a half-written job. Fails with an IO
    /// error when the directory cannot be created or written.
    pub async fn enqueue(&self, job: &RenderJob) -> QueueResult<PathBuf> {
        job.ensure_valid()
            .map_err(|e| QueueError::InvalidJob(format!("{}: {}", job.id, e)))?;

        let dir = &self.config.dir;
        fs::create_dir_all(dir)
            .await
            .map_err(|e| QueueError::unwritable(dir, e))?;

        let path = self.job_path(job);
        if fs::try_exists(&path).await.unwrap_or(false) {
            warn!(job_id = %job.id, path = %path.display(), "Overwriting existing job file");
        }

        let staged = dir.join(format!(".{}.tmp", job_file_name(&job.id)));
        let body = serde_json::to_string_pretty(job)?;

        if let Err(e) = fs::write(&staged, body).await {
            return Err(QueueError::unwritable(dir, e));
        }
        if let Err(e) = fs::rename(&staged, &path).await {
            let _ = fs::remove_file(&staged).await;
            return Err(QueueError::unwritable(dir, e));
        }

        metrics::counter!("dataviz_jobs_enqueued_total").increment(1);
        info!(job_id = %job.id, path = %path.display(), "Enqueued render job");
        Ok(path)
    }

    /// Lazily read the job files currently in the queue directory.
    ///
    /// Each call starts a fresh scan, so the stream always reflects what
    /// is on disk. Order follows directory enumeration. A file that cannot
    /// be read or parsed yields an `Err` item and the scan continues; a
    /// missing directory is an empty queue.
    pub fn list_pending(&self) -> impl Stream<Item = QueueResult<PendingJob>> + Send + 'static {
        stream::unfold(ScanState::Start(self.config.dir.clone()), |mut state| async move {
            loop {
                state = match state {
                    ScanState::Done => return None,
                    ScanState::Start(dir) => match fs::read_dir(&dir).await {
                        Ok(entries) => ScanState::Reading(dir, entries),
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                            debug!(dir = %dir.display(), "Queue directory does not exist");
                            return None;
                        }
                        Err(e) => {
                            return Some((Err(QueueError::unreadable(&dir, e)), ScanState::Done))
                        }
                    },
                    ScanState::Reading(dir, mut entries) => match entries.next_entry().await {
                        Ok(Some(entry)) => {
                            let path = entry.path();
                            if !is_job_file(&path) {
                                ScanState::Reading(dir, entries)
                            } else {
                                let item = load_job(path).await;
                                return Some((item, ScanState::Reading(dir, entries)));
                            }
                        }
                        Ok(None) => return None,
                        Err(e) => {
                            return Some((Err(QueueError::unreadable(&dir, e)), ScanState::Done))
                        }
                    },
                };
            }
        })
    }

    /// One scan, sorted by file name (job ids sort chronologically).
    pub async fn snapshot(&self) -> Vec<QueueResult<PendingJob>> {
        let mut items: Vec<_> = self.list_pending().collect().await;
        items.sort_by(|a, b| sort_key(a).cmp(&sort_key(b)));
        items
    }

    /// Apply the completion policy to a rendered job.
    pub async fn complete(&self, pending: &PendingJob) -> QueueResult<Completion> {
        let completion = match self.config.completion {
            CompletionPolicy::Leave => Completion::Left,
            CompletionPolicy::Delete => {
                fs::remove_file(&pending.path).await?;
                Completion::Deleted
            }
            CompletionPolicy::Archive => {
                let archive = self.config.archive_dir();
                fs::create_dir_all(&archive)
                    .await
                    .map_err(|e| QueueError::unwritable(&archive, e))?;

                let file_name = pending
                    .path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(job_file_name(&pending.job.id)));
                let dest = archive.join(file_name);
                move_across(&pending.path, &dest).await?;
                Completion::Archived(dest)
            }
        };

        debug!(
            job_id = %pending.job.id,
            policy = %self.config.completion,
            "Completed job file"
        );
        Ok(completion)
    }
}

fn sort_key(item: &QueueResult<PendingJob>) -> Option<PathBuf> {
    match item {
        Ok(pending) => Some(pending.path.clone()),
        Err(e) => e.path().cloned(),
    }
}

/// Rename, falling back to copy + remove across filesystems (EXDEV).
async fn move_across(src: &Path, dst: &Path) -> QueueResult<()> {
    match fs::rename(src, dst).await {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            fs::copy(src, dst).await?;
            fs::remove_file(src).await?;
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
