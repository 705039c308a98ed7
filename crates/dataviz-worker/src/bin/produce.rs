//! Daily producer: queue today's render jobs.

use std::sync::Arc;
use tracing::{error, info};

use dataviz_queue::JobQueue;
use dataviz_worker::{
    init_tracing, DailyProducer, EdgeTts, MarketDataClient, OpenAiNarrator, TopicsConfig,
    WorkerConfig,
};

#[tokio::main]
async fn main() {
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting dataviz-produce");

    let topics = match TopicsConfig::from_env() {
        Ok(t) => t,
        Err(e) => {
            error!("Failed to load topics: {}", e);
            std::process::exit(1);
        }
    };

    let source = match MarketDataClient::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create market data client: {}", e);
            std::process::exit(1);
        }
    };

    let narrator = match OpenAiNarrator::from_env() {
        Ok(n) => n,
        Err(e) => {
            error!("Failed to create narrator: {}", e);
            std::process::exit(1);
        }
    };

    let config = WorkerConfig::from_env();
    let producer = DailyProducer::new(
        Arc::new(source),
        Arc::new(narrator),
        Arc::new(EdgeTts::from_env()),
        JobQueue::from_env(),
        config.voice_dir,
        topics.settings.videos_per_day,
    );

    let report = producer.run(&topics.enabled_topics()).await;
    info!(
        queued = report.queued.len(),
        skipped = report.skipped,
        fetch_failures = report.fetch_failures,
        "Production complete"
    );

    if report.queued.is_empty() && report.skipped > 0 {
        std::process::exit(1);
    }
}
