//! Final composition: frames (or a silent video) + narration audio into a
//! 9:16 H.264/AAC file.
//!
//! Audio is the duration authority. With [`DurationPolicy::FreezeLastFrame`]
//! the last video frame is cloned for `pad_secs` and `-shortest` cuts the
//! result when the audio ends; when ffprobe can read the audio length an
//! explicit `-t` pins the output to it.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use dataviz_models::encoding::{PORTRAIT_HEIGHT, PORTRAIT_WIDTH};
use dataviz_models::EncodingConfig;

use crate::caption::{build_caption_filters, CaptionStyle};
use crate::command::{FfmpegCommand, FfmpegRunner, DEFAULT_FFMPEG_BIN};
use crate::error::{MediaError, MediaResult};
use crate::frames::FrameSequence;
use crate::probe::{probe_media_with, DEFAULT_FFPROBE_BIN};

/// Smallest output accepted as a real video.
pub const DEFAULT_MIN_OUTPUT_BYTES: u64 = 10 * 1024;

/// How long the last frame is held when the video is shorter than the audio.
pub const DEFAULT_FREEZE_PAD_SECS: f64 = 60.0;

/// Default hard limit on a single encode.
pub const DEFAULT_ENCODE_TIMEOUT: Duration = Duration::from_secs(600);

const BACKGROUND_HEX: &str = "0x050505";

/// Video side of the composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodeInput {
    /// Numbered PNG frames read at the sequence's frame rate
    Frames(FrameSequence),
    /// Pre-encoded video without audio
    SilentVideo(PathBuf),
}

impl EncodeInput {
    fn check(&self) -> MediaResult<()> {
        match self {
            EncodeInput::Frames(seq) => {
                if seq.fps == 0 {
                    return Err(MediaError::validation("frame rate must be positive"));
                }
                seq.verify()
            }
            EncodeInput::SilentVideo(path) if !path.is_file() => {
                Err(MediaError::missing_asset(path))
            }
            EncodeInput::SilentVideo(_) => Ok(()),
        }
    }
}

/// How video and audio lengths are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationPolicy {
    /// Stop at the end of the shorter stream
    Shortest,
    /// Hold the last frame for `pad_secs`, then cut at the end of the audio
    FreezeLastFrame { pad_secs: f64 },
}

impl Default for DurationPolicy {
    fn default() -> Self {
        DurationPolicy::FreezeLastFrame {
            pad_secs: DEFAULT_FREEZE_PAD_SECS,
        }
    }
}

/// Encoder settings passed explicitly into every composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub encoding: EncodingConfig,
    pub duration_policy: DurationPolicy,
    /// `None` waits forever
    pub timeout: Option<Duration>,
    pub min_output_bytes: u64,
    pub caption: CaptionStyle,
    pub ffmpeg_bin: String,
    /// Used to read the audio length; bounded by `timeout`
    pub ffprobe_bin: String,
    /// Probe the audio and add `-t <duration>`
    pub match_audio_duration: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            width: PORTRAIT_WIDTH,
            height: PORTRAIT_HEIGHT,
            fps: 30,
            encoding: EncodingConfig::default(),
            duration_policy: DurationPolicy::default(),
            timeout: Some(DEFAULT_ENCODE_TIMEOUT),
            min_output_bytes: DEFAULT_MIN_OUTPUT_BYTES,
            caption: CaptionStyle::default(),
            ffmpeg_bin: DEFAULT_FFMPEG_BIN.to_string(),
            ffprobe_bin: DEFAULT_FFPROBE_BIN.to_string(),
            match_audio_duration: true,
        }
    }
}

/// One composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeRequest {
    pub input: EncodeInput,
    pub audio: PathBuf,
    pub output: PathBuf,
    /// Narration burned in at the bottom of the frame
    pub caption: Option<String>,
}

impl ComposeRequest {
    pub fn new(input: EncodeInput, audio: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input,
            audio: audio.into(),
            output: output.into(),
            caption: None,
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }
}

/// Encode `request.output`.
///
/// All inputs are checked before any process is spawned. A zero exit with
/// an output below `min_output_bytes` is still a failure.
pub async fn compose_video(request: &ComposeRequest, config: &ComposeConfig) -> MediaResult<PathBuf> {
    request.input.check()?;
    if !request.audio.is_file() {
        return Err(MediaError::missing_asset(&request.audio));
    }

    let audio_duration = if config.match_audio_duration {
        match probe_media_with(&config.ffprobe_bin, &request.audio, config.timeout).await {
            Ok(info) if info.duration > 0.0 => Some(info.duration),
            Ok(_) => None,
            Err(e) => {
                warn!(audio = %request.audio.display(), "Audio duration unavailable, relying on -shortest: {}", e);
                None
            }
        }
    } else {
        None
    };

    let cmd = build_compose_command(request, config, audio_duration)?;

    if let Some(parent) = request.output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut runner = FfmpegRunner::new().with_binary(&config.ffmpeg_bin);
    if let Some(timeout) = config.timeout {
        runner = runner.with_timeout(timeout);
    }

    let started = Instant::now();
    let expected = audio_duration.map(Duration::from_secs_f64);
    let result = runner
        .run_with_progress(&cmd, move |progress| {
            if let Some(expected) = expected {
                debug!(percent = progress.percentage(expected), "Encoding");
            }
        })
        .await;

    if let Err(e) = result {
        discard_partial(&request.output).await;
        metrics::counter!("dataviz_encode_total", "status" => "failed").increment(1);
        return Err(e);
    }

    let size = match tokio::fs::metadata(&request.output).await {
        Ok(meta) => meta.len(),
        Err(_) => 0,
    };
    if size < config.min_output_bytes {
        discard_partial(&request.output).await;
        metrics::counter!("dataviz_encode_total", "status" => "too_small").increment(1);
        return Err(MediaError::OutputTooSmall {
            path: request.output.clone(),
            size,
            min_bytes: config.min_output_bytes,
        });
    }

    let elapsed = started.elapsed();
    metrics::counter!("dataviz_encode_total", "status" => "ok").increment(1);
    metrics::histogram!("dataviz_encode_seconds").record(elapsed.as_secs_f64());
    info!(
        output = %request.output.display(),
        size_bytes = size,
        elapsed_ms = elapsed.as_millis() as u64,
        "Composed video"
    );

    Ok(request.output.clone())
}

/// Build the FFmpeg invocation without running it.
pub fn build_compose_command(
    request: &ComposeRequest,
    config: &ComposeConfig,
    audio_duration: Option<f64>,
) -> MediaResult<FfmpegCommand> {
    if config.fps == 0 {
        return Err(MediaError::validation("output frame rate must be positive"));
    }

    let captions = match &request.caption {
        Some(text) => build_caption_filters(text, &config.caption)?,
        None => Vec::new(),
    };

    let (w, h, fps) = (config.width, config.height, config.fps);
    let mut chain = vec![
        format!("scale={w}:{h}:force_original_aspect_ratio=decrease"),
        format!("pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color={BACKGROUND_HEX}"),
        "setsar=1".to_string(),
        format!("fps={fps}"),
    ];
    if let DurationPolicy::FreezeLastFrame { pad_secs } = config.duration_policy {
        chain.push(format!("tpad=stop_mode=clone:stop_duration={}", pad_secs));
    }
    chain.extend(captions);
    let graph = format!("[0:v]{}[v_final]", chain.join(","));

    let mut cmd = match &request.input {
        EncodeInput::Frames(seq) => FfmpegCommand::new(seq.pattern(), &request.output)
            .input_frame_rate(seq.fps),
        EncodeInput::SilentVideo(path) => FfmpegCommand::new(path, &request.output),
    }
    .input(&request.audio)
    .filter_complex(graph)
    .map("[v_final]")
    .map("1:a")
    .encoding(&config.encoding)
    .frame_rate(fps)
    .shortest();

    if let Some(secs) = audio_duration {
        cmd = cmd.output_duration(secs);
    }

    Ok(cmd.faststart())
}

async fn discard_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %path.display(), "Failed to remove partial output: {}", e);
        }
    }
}
