//! Object store abstraction over R2.

use async_trait::async_trait;
use std::path::Path;

use crate::client::{ObjectInfo, R2Client};
use crate::error::StorageResult;

/// The subset of bucket operations the publish/download tools need.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>>;

    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()>;
}

#[async_trait]
impl ObjectStore for R2Client {
    async fn exists(&self, key: &str) -> StorageResult<bool> {
        R2Client::exists(self, key).await
    }

    async fn upload_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        R2Client::upload_file(self, path, key, content_type).await
    }

    async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        R2Client::list_objects(self, prefix).await
    }

    async fn download_file(&self, key: &str, path: &Path) -> StorageResult<()> {
        R2Client::download_file(self, key, path).await
    }
}
