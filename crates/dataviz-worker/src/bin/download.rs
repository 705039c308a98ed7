//! Download published videos that are not yet on this machine.

use std::path::PathBuf;
use tracing::{error, info};

use dataviz_storage::R2Client;
use dataviz_worker::publish::DEFAULT_DOWNLOAD_DIR;
use dataviz_worker::{init_tracing, Downloader};

#[tokio::main]
async fn main() {
    let _ = rustls::crypto::ring::default_provider().install_default();

    dotenvy::dotenv().ok();
    init_tracing();

    let local_dir = std::env::var("DOWNLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOWNLOAD_DIR));

    let client = match R2Client::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create R2 client: {}", e);
            std::process::exit(1);
        }
    };

    let downloader = Downloader::new(client, local_dir);
    match downloader.download_new().await {
        Ok(files) => info!(
            count = files.len(),
            dir = %downloader.local_dir().display(),
            "Download complete"
        ),
        Err(e) => {
            error!("Download failed: {}", e);
            std::process::exit(1);
        }
    }
}
