//! Shared data models for the DataViz render pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Render jobs and their on-disk JSON format
//! - Chart data (scalar comparison or time series)
//! - Data points produced by market/economic sources
//! - Encoding configuration
//! - The error taxonomy shared by every pipeline stage

pub mod chart;
pub mod data_point;
pub mod encoding;
pub mod error;
pub mod job;

pub use chart::{ChartData, ChartType, Series};
pub use data_point::{Category, DataPoint};
pub use encoding::EncodingConfig;
pub use error::{is_cross_device, ErrorKind, ModelError, ModelResult};
pub use job::{JobId, RenderJob};
