//! Worker configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use dataviz_media::compose::{DEFAULT_ENCODE_TIMEOUT, DEFAULT_FREEZE_PAD_SECS, DEFAULT_MIN_OUTPUT_BYTES};
use dataviz_media::{resolve_font_path, CaptionStyle, ChartConfig, ComposeConfig, DurationPolicy};
use dataviz_models::encoding::{PORTRAIT_HEIGHT, PORTRAIT_WIDTH};
use dataviz_models::{EncodingConfig, JobId};
use tracing::warn;

/// When the batch process exits non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitPolicy {
    /// Any failed job fails the run
    #[default]
    AnyFailed,
    /// Only a run where every job failed is a failure
    AllFailed,
}

impl FromStr for ExitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "any-failed" | "any" => Ok(ExitPolicy::AnyFailed),
            "all-failed" | "all" => Ok(ExitPolicy::AllFailed),
            other => Err(format!("unknown exit policy: {}", other)),
        }
    }
}

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Parent of the per-job temporary workspaces
    pub work_dir: PathBuf,
    /// Where narration audio is found (`voiceover_<id>.mp3`)
    pub voice_dir: PathBuf,
    /// Where finished videos go (`final_<id>.mp4`)
    pub output_dir: PathBuf,
    /// Frames per job
    pub total_frames: usize,
    /// Frame rate of the exported frames and the output
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    /// TrueType font for chart text and captions
    pub font_path: Option<PathBuf>,
    /// Hard limit on one encoder run
    pub encode_timeout: Duration,
    /// Outputs below this size are treated as corrupt
    pub min_output_bytes: u64,
    /// Seconds the last frame is held while the narration continues
    pub freeze_pad_secs: f64,
    /// Burn the narration into the video
    pub captions: bool,
    /// Encoder executable
    pub ffmpeg_bin: String,
    /// Probe executable, used to read the narration length
    pub ffprobe_bin: String,
    pub exit_policy: ExitPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("dataviz"),
            voice_dir: PathBuf::from("outputs"),
            output_dir: PathBuf::from("output"),
            total_frames: dataviz_media::chart::DEFAULT_TOTAL_FRAMES,
            fps: 30,
            width: PORTRAIT_WIDTH,
            height: PORTRAIT_HEIGHT,
            font_path: None,
            encode_timeout: DEFAULT_ENCODE_TIMEOUT,
            min_output_bytes: DEFAULT_MIN_OUTPUT_BYTES,
            freeze_pad_secs: DEFAULT_FREEZE_PAD_SECS,
            captions: true,
            ffmpeg_bin: "ffmpeg".to_string(),
            ffprobe_bin: "ffprobe".to_string(),
            exit_policy: ExitPolicy::default(),
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let exit_policy = match std::env::var("BATCH_EXIT_POLICY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, using any-failed", e);
                ExitPolicy::AnyFailed
            }),
            Err(_) => ExitPolicy::AnyFailed,
        };

        Self {
            work_dir: std::env::var("WORKER_WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            voice_dir: std::env::var("VOICE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.voice_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            total_frames: env_parse("RENDER_TOTAL_FRAMES").unwrap_or(defaults.total_frames),
            fps: env_parse("RENDER_FPS").unwrap_or(defaults.fps),
            width: env_parse("RENDER_WIDTH").unwrap_or(defaults.width),
            height: env_parse("RENDER_HEIGHT").unwrap_or(defaults.height),
            font_path: std::env::var("RENDER_FONT_PATH").ok().map(PathBuf::from),
            encode_timeout: Duration::from_secs(
                env_parse("ENCODE_TIMEOUT_SECS").unwrap_or(defaults.encode_timeout.as_secs()),
            ),
            min_output_bytes: env_parse("ENCODE_MIN_OUTPUT_BYTES")
                .unwrap_or(defaults.min_output_bytes),
            freeze_pad_secs: env_parse("ENCODE_FREEZE_PAD_SECS")
                .unwrap_or(defaults.freeze_pad_secs),
            captions: env_parse("RENDER_CAPTIONS").unwrap_or(defaults.captions),
            ffmpeg_bin: std::env::var("FFMPEG_BIN").unwrap_or(defaults.ffmpeg_bin),
            ffprobe_bin: std::env::var("FFPROBE_BIN").unwrap_or(defaults.ffprobe_bin),
            exit_policy,
        }
    }

    /// `<voice_dir>/voiceover_<id>.mp3`
    pub fn audio_path(&self, id: &JobId) -> PathBuf {
        audio_path(&self.voice_dir, id)
    }

    /// `<output_dir>/final_<id>.mp4`
    pub fn output_path(&self, id: &JobId) -> PathBuf {
        self.output_dir.join(output_file_name(id))
    }

    /// Renderer settings derived from this config.
    pub fn chart_config(&self) -> ChartConfig {
        ChartConfig {
            total_frames: self.total_frames,
            width: self.width,
            height: self.height,
            font_path: self.font_path.clone(),
            ..ChartConfig::default()
        }
    }

    /// Encoder settings derived from this config.
    pub fn compose_config(&self) -> ComposeConfig {
        let duration_policy = if self.freeze_pad_secs > 0.0 {
            DurationPolicy::FreezeLastFrame {
                pad_secs: self.freeze_pad_secs,
            }
        } else {
            DurationPolicy::Shortest
        };

        let mut caption = CaptionStyle::default();
        caption.font_file = resolve_font_path(self.font_path.as_deref());

        ComposeConfig {
            width: self.width,
            height: self.height,
            fps: self.fps,
            encoding: EncodingConfig::default(),
            duration_policy,
            timeout: Some(self.encode_timeout),
            min_output_bytes: self.min_output_bytes,
            caption,
            ffmpeg_bin: self.ffmpeg_bin.clone(),
            ffprobe_bin: self.ffprobe_bin.clone(),
            match_audio_duration: true,
        }
    }
}

/// `voiceover_<id>.mp3` inside `voice_dir`.
pub fn audio_path(voice_dir: &Path, id: &JobId) -> PathBuf {
    voice_dir.join(format!("voiceover_{}.mp3", id))
}

/// `final_<id>.mp4`
pub fn output_file_name(id: &JobId) -> String {
    format!("final_{}.mp4", id)
}
