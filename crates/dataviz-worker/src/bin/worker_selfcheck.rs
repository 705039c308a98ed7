use std::path::Path;

use dataviz_media::check_ffmpeg;
use dataviz_queue::QueueConfig;
use dataviz_storage::R2Client;
use dataviz_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env();
    let queue = QueueConfig::from_env();

    println!(
        "worker-selfcheck: starting with work_dir={} queue_dir={}",
        config.work_dir.display(),
        queue.dir.display()
    );
    ensure_dir(&config.work_dir).await?;
    ensure_dir(&queue.dir).await?;
    ensure_dir(&config.output_dir).await?;

    let ffmpeg = check_ffmpeg(&config.ffmpeg_bin)?;
    println!("worker-selfcheck: ffmpeg at {}", ffmpeg.display());

    // Publishing is optional; only check R2 when it is configured
    if std::env::var("R2_ENDPOINT_URL").is_ok() {
        let _ = rustls::crypto::ring::default_provider().install_default();
        let client = R2Client::from_env()?;
        client.check_connectivity().await?;
        println!("worker-selfcheck: R2 bucket {} reachable", client.bucket());
    }

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {}", path.display(), e))?;

    let probe = path.join(".selfcheck");
    tokio::fs::write(&probe, b"ok")
        .await
        .map_err(|e| anyhow::anyhow!("{} is not writable: {}", path.display(), e))?;
    tokio::fs::remove_file(&probe).await?;
    Ok(())
}
