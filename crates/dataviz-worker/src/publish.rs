//! Publishing finished videos to object storage, and fetching them back.

use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use dataviz_storage::{content_type_for, render_key, ObjectStore, RENDERS_PREFIX};

use crate::error::WorkerResult;

/// Local directory `dataviz-download` writes into by default.
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloaded_videos";

/// Uploads one finished video.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns `false` when there is nothing to publish at `video`.
    async fn publish(&self, video: &Path) -> WorkerResult<bool>;
}

/// Publisher backed by an object store under `renders/`.
pub struct R2Publisher<S> {
    store: S,
}

impl<S: ObjectStore> R2Publisher<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: ObjectStore> Publisher for R2Publisher<S> {
    async fn publish(&self, video: &Path) -> WorkerResult<bool> {
        if !video.is_file() {
            warn!(path = %video.display(), "Video not found, nothing to publish");
            return Ok(false);
        }

        let key = render_key(video)?;
        if self.store.exists(&key).await? {
            info!(key = %key, "Already published, skipping");
            return Ok(true);
        }

        self.store
            .upload_file(video, &key, content_type_for(video))
            .await?;
        metrics::counter!("dataviz_published_total").increment(1);
        info!(key = %key, path = %video.display(), "Published video");
        Ok(true)
    }
}

/// Result of publishing an output directory.
#[derive(Debug, Default, Serialize)]
pub struct PublishSummary {
    pub published: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

/// Finished videos (`final_*.mp4`) in `dir`, sorted by name.
pub async fn finished_videos(dir: &Path) -> WorkerResult<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut videos = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_video = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("final_") && n.ends_with(".mp4"));
        if is_video && path.is_file() {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

/// Publish every finished video in `dir`, continuing past failures.
pub async fn publish_outputs(
    publisher: &dyn Publisher,
    dir: &Path,
) -> WorkerResult<PublishSummary> {
    let mut summary = PublishSummary::default();
    for video in finished_videos(dir).await? {
        match publisher.publish(&video).await {
            Ok(true) => summary.published.push(video),
            Ok(false) => {}
            Err(e) => {
                warn!(path = %video.display(), "Publish failed: {}", e);
                summary.failed.push(video);
            }
        }
    }
    Ok(summary)
}

/// Mirrors published videos into a local directory.
pub struct Downloader<S> {
    store: S,
    prefix: String,
    local_dir: PathBuf,
}

impl<S: ObjectStore> Downloader<S> {
    pub fn new(store: S, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            prefix: RENDERS_PREFIX.to_string(),
            local_dir: local_dir.into(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Download every object under the prefix that is not already on
    /// disk. Returns the paths written.
    pub async fn download_new(&self) -> WorkerResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(&self.local_dir).await?;

        let objects = self.store.list_objects(&self.prefix).await?;
        info!(count = objects.len(), prefix = %self.prefix, "Listed published videos");

        let mut downloaded = Vec::new();
        for object in objects {
            let name = object.file_name();
            if name.is_empty() {
                continue;
            }
            let local = self.local_dir.join(name);
            if local.exists() {
                continue;
            }

            self.store.download_file(&object.key, &local).await?;
            info!(key = %object.key, path = %local.display(), "Downloaded video");
            downloaded.push(local);
        }
        Ok(downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataviz_storage::{ObjectInfo, StorageError, StorageResult};
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MemoryStore {
        objects: Mutex<BTreeMap<String, Vec<u8>>>,
        uploads: Mutex<usize>,
    }

    #[async_trait]
    impl ObjectStore for MemoryStore {
        async fn exists(&self, key: &str) -> StorageResult<bool> {
            Ok(self.objects.lock().unwrap().contains_key(key))
        }

        async fn upload_file(&self, path: &Path, key: &str, _: &str) -> StorageResult<()> {
            let bytes = std::fs::read(path)?;
            self.objects.lock().unwrap().insert(key.to_string(), bytes);
            *self.uploads.lock().unwrap() += 1;
            Ok(())
        }

        async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
            Ok(self
                .objects
                .lock()
                .unwrap()
                .iter()
                .filter(|(k, _)| k.starts_with(prefix))
                .map(|(k, v)| ObjectInfo {
                    key: k.clone(),
                    size: v.len() as u64,
                    last_modified: None,
                })
                .collect())
        }

        async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()> {
            let bytes = self
                .objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| StorageError::not_found(key))?;
            std::fs::write(path, bytes)?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_publish_uploads_once() {
        let dir = TempDir::new().unwrap();
        let video = dir.path().join("final_20240115_103000_ab12cd34.mp4");
        std::fs::write(&video, b"mp4").unwrap();

        let publisher = R2Publisher::new(MemoryStore::default());
        assert!(publisher.publish(&video).await.unwrap());
        assert!(publisher.publish(&video).await.unwrap());

        assert_eq!(*publisher.store.uploads.lock().unwrap(), 1);
        assert!(publisher
            .store
            .objects
            .lock()
            .unwrap()
            .contains_key("renders/final_20240115_103000_ab12cd34.mp4"));
    }

    #[tokio::test]
    async fn test_publish_missing_file_returns_false() {
        let publisher = R2Publisher::new(MemoryStore::default());
        assert!(!publisher
            .publish(Path::new("/nonexistent/final_1.mp4"))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_publish_outputs_only_takes_finished_videos() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("final_b.mp4"), b"b").unwrap();
        std::fs::write(dir.path().join("final_a.mp4"), b"a").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("final_a.mp4.partial"), b"x").unwrap();

        let publisher = R2Publisher::new(MemoryStore::default());
        let summary = publish_outputs(&publisher, dir.path()).await.unwrap();

        assert_eq!(
            summary.published,
            vec![dir.path().join("final_a.mp4"), dir.path().join("final_b.mp4")]
        );
        assert!(summary.failed.is_empty());
    }

    #[tokio::test]
    async fn test_publish_outputs_missing_dir_is_empty() {
        let publisher = R2Publisher::new(MemoryStore::default());
        let summary = publish_outputs(&publisher, Path::new("/nonexistent/output"))
            .await
            .unwrap();
        assert!(summary.published.is_empty());
    }

    #[tokio::test]
    async fn test_download_skips_existing_files() {
        let store = MemoryStore::default();
        {
            let mut objects = store.objects.lock().unwrap();
            objects.insert("renders/final_1.mp4".into(), b"one".to_vec());
            objects.insert("renders/final_2.mp4".into(), b"two".to_vec());
            objects.insert("other/final_3.mp4".into(), b"three".to_vec());
        }

        let dir = TempDir::new().unwrap();
        let local = dir.path().join("downloaded_videos");
        std::fs::create_dir_all(&local).unwrap();
        std::fs::write(local.join("final_1.mp4"), b"kept").unwrap();

        let downloader = Downloader::new(store, &local);
        let written = downloader.download_new().await.unwrap();

        assert_eq!(written, vec![local.join("final_2.mp4")]);
        assert_eq!(std::fs::read(local.join("final_1.mp4")).unwrap(), b"kept");
        assert_eq!(std::fs::read(local.join("final_2.mp4")).unwrap(), b"two");
        assert!(!local.join("final_3.mp4").exists());
    }
}
