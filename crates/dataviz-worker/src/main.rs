//! Render batch binary: renders every job currently in the queue.

use tracing::{info, warn};

use dataviz_queue::JobQueue;
use dataviz_worker::{init_tracing, BatchRunner, JobRenderer, WorkerConfig};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting dataviz-render");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);
    let exit_policy = config.exit_policy;

    let queue = JobQueue::from_env();
    let runner = BatchRunner::new(queue, JobRenderer::new(config));

    let report = runner.run().await;
    for failure in &report.failures {
        warn!(
            job_id = %failure.job_id,
            kind = %failure.kind,
            "Job failed: {}",
            failure.message
        );
    }
    info!(
        rendered = report.rendered.len(),
        failed = report.failures.len(),
        total = report.total(),
        "Render batch complete"
    );

    std::process::exit(report.exit_code(exit_policy));
}
