//! File-backed render job queue.
//!
//! This crate provides:
//! - Enqueueing jobs as one JSON file per job
//! - A lazy, restartable scan of pending jobs
//! - Explicit completion bookkeeping (archive, delete or leave)

pub mod error;
pub mod job_file;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job_file::{job_file_name, job_id_from_path, PendingJob};
pub use queue::{Completion, CompletionPolicy, JobQueue, QueueConfig};
