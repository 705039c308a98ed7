//! Batch driver: scan the queue once and render jobs one at a time.

use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Instrument};

use dataviz_models::ErrorKind;
use dataviz_queue::{job_id_from_path, JobQueue};

use crate::config::ExitPolicy;
use crate::logging::JobLogger;
use crate::render_job::JobRenderer;

/// A job that did not produce a video.
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub job_id: String,
    pub path: Option<PathBuf>,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub rendered: Vec<PathBuf>,
    pub failures: Vec<JobFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.rendered.len() + self.failures.len()
    }

    /// Process exit status for this run. An empty queue is a success.
    pub fn exit_code(&self, policy: ExitPolicy) -> i32 {
        let failed = match policy {
            ExitPolicy::AnyFailed => !self.failures.is_empty(),
            ExitPolicy::AllFailed => !self.failures.is_empty() && self.rendered.is_empty(),
        };
        i32::from(failed)
    }

    fn record_failure(&mut self, failure: JobFailure) {
        metrics::counter!(
            "dataviz_jobs_total",
            "status" => "failed",
            "kind" => failure.kind.as_str()
        )
        .increment(1);
        self.failures.push(failure);
    }
}

/// Sequential renderer over one snapshot of the queue.
pub struct BatchRunner {
    queue: JobQueue,
    renderer: JobRenderer,
}

impl BatchRunner {
    pub fn new(queue: JobQueue, renderer: JobRenderer) -> Self {
        Self { queue, renderer }
    }

    /// Render every job found by a single scan.
    ///
    /// Failures are recorded and the batch moves on; nothing is retried.
    /// Completion bookkeeping only touches jobs that rendered.
    pub async fn run(&self) -> BatchReport {
        let mut report = BatchReport::default();
        let items = self.queue.snapshot().await;
        info!(
            jobs = items.len(),
            dir = %self.queue.dir().display(),
            "Scanned render queue"
        );

        for item in items {
            let pending = match item {
                Ok(pending) => pending,
                Err(e) => {
                    let job_id = e
                        .path()
                        .and_then(|p| job_id_from_path(p))
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    JobLogger::from_string(&job_id, "render").log_error(&e.to_string());
                    report.record_failure(JobFailure {
                        job_id,
                        path: e.path().cloned(),
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let logger = JobLogger::new(&pending.job.id, "render");
            let result = self
                .renderer
                .render(&pending.job)
                .instrument(logger.create_span())
                .await;

            match result {
                Ok(output) => {
                    metrics::counter!("dataviz_jobs_total", "status" => "rendered").increment(1);
                    if let Err(e) = self.queue.complete(&pending).await {
                        logger.log_warning(&format!("rendered but completion failed: {}", e));
                    }
                    report.rendered.push(output);
                }
                Err(e) => {
                    logger.log_error(&format!("[{}] {}", e.kind(), e));
                    report.record_failure(JobFailure {
                        job_id: pending.job.id.to_string(),
                        path: Some(pending.path.clone()),
                        kind: e.kind(),
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            rendered = report.rendered.len(),
            failed = report.failures.len(),
            "Batch finished"
        );
        report
    }
}
