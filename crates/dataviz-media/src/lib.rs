#![deny(unreachable_patterns)]
//! Chart rendering and FFmpeg CLI wrapper for data videos.
//!
//! This crate provides:
//! - Deterministic chart geometry for a progressive line reveal
//! - Headless rasterization of frames to numbered PNG files
//! - Type-safe FFmpeg command building with multiple inputs
//! - A runner with timeout, progress parsing and captured diagnostics
//! - Caption (drawtext) filter building with metacharacter escaping
//! - Final 9:16 composition of frames + narration audio

pub mod caption;
pub mod chart;
pub mod command;
pub mod compose;
pub mod error;
pub mod frames;
pub mod fs_utils;
pub mod probe;
pub mod progress;

pub use caption::{build_caption_filters, sanitize_caption, CaptionStyle};
pub use chart::{
    format_value, load_font, resample, resolve_font_path, y_bounds, ChartConfig, ChartPlan,
    FrameGeometry, FrameRasterizer, TrendPalette,
};
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use compose::{
    build_compose_command, compose_video, ComposeConfig, ComposeRequest, DurationPolicy,
    EncodeInput,
};
pub use error::{MediaError, MediaResult};
pub use frames::{render_frames, FrameSequence, FRAME_PATTERN};
pub use fs_utils::move_file;
pub use probe::{get_duration, probe_media, probe_media_with, MediaInfo};
pub use progress::FfmpegProgress;
