//! On-disk job file naming and loading.

use std::path::{Path, PathBuf};

use dataviz_models::{JobId, RenderJob};

use crate::error::{QueueError, QueueResult};

const JOB_FILE_PREFIX: &str = "video_";
const JOB_FILE_SUFFIX: &str = ".json";

/// `video_<id>.json`
pub fn job_file_name(id: &JobId) -> String {
    format!("{}{}{}", JOB_FILE_PREFIX, id, JOB_FILE_SUFFIX)
}

/// Recover the job id from a job file path, without reading it.
pub fn job_id_from_path(path: &Path) -> Option<JobId> {
    let name = path.file_name()?.to_str()?;
    let id = name.strip_prefix(JOB_FILE_PREFIX)?.strip_suffix(JOB_FILE_SUFFIX)?;
    (!id.is_empty()).then(|| JobId::from_string(id))
}

pub(crate) fn is_job_file(path: &Path) -> bool {
    job_id_from_path(path).is_some()
}

/// A job read from the queue, with the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingJob {
    pub path: PathBuf,
    pub job: RenderJob,
}

pub(crate) async fn load_job(path: PathBuf) -> QueueResult<PendingJob> {
    let raw = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| QueueError::unreadable(&path, e))?;

    match serde_json::from_str::<RenderJob>(&raw) {
        Ok(job) => Ok(PendingJob { path, job }),
        Err(source) => Err(QueueError::Malformed { path, source }),
    }
}
