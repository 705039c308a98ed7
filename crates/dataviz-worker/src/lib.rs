//! DataViz render worker.
//!
//! This crate provides:
//! - The render batch driver (queue scan, per-job rendering, exit status)
//! - The daily producer (market data, narration, voiceover, enqueue)
//! - Publishing to and downloading from R2
//! - Worker configuration and structured logging

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod market_data;
pub mod narration;
pub mod producer;
pub mod publish;
pub mod render_job;
pub mod topics;
pub mod voiceover;

pub use batch::{BatchReport, BatchRunner, JobFailure};
pub use config::{ExitPolicy, WorkerConfig};
pub use error::{WorkerError, WorkerResult};
pub use logging::{init_tracing, JobLogger};
pub use market_data::{DataSource, MarketDataClient};
pub use narration::{Narrator, NarratorConfig, OpenAiNarrator};
pub use producer::{DailyProducer, ProduceReport};
pub use publish::{publish_outputs, Downloader, Publisher, R2Publisher};
pub use render_job::JobRenderer;
pub use topics::{Topic, TopicsConfig};
pub use voiceover::{EdgeTts, EdgeTtsConfig, SpeechSynthesizer};
