//! Upload finished videos to R2.

use tracing::{error, info};

use dataviz_storage::R2Client;
use dataviz_worker::{init_tracing, publish_outputs, R2Publisher, WorkerConfig};

#[tokio::main]
async fn main() {
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    let config = WorkerConfig::from_env();

    let client = match R2Client::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create R2 client: {}", e);
            std::process::exit(1);
        }
    };
    info!(bucket = client.bucket(), dir = %config.output_dir.display(), "Publishing outputs");

    let publisher = R2Publisher::new(client);
    match publish_outputs(&publisher, &config.output_dir).await {
        Ok(summary) => {
            info!(
                published = summary.published.len(),
                failed = summary.failed.len(),
                "Publish complete"
            );
            if !summary.failed.is_empty() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Publish failed: {}", e);
            std::process::exit(1);
        }
    }
}
