//! Cloudflare R2 storage client.
//!
//! This crate provides:
//! - File upload/download to R2
//! - Prefix listing and existence checks
//! - The `ObjectStore` seam used by the publish and download tools

pub mod client;
pub mod error;
pub mod keys;
pub mod store;

pub use client::{ObjectInfo, R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use keys::{content_type_for, render_key, DEFAULT_BUCKET, RENDERS_PREFIX};
pub use store::ObjectStore;
