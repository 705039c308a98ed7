//! Rendering one queued job into `final_<id>.mp4`.

use std::path::PathBuf;
use std::time::Instant;

use dataviz_media::{
    compose_video, load_font, move_file, render_frames, ChartConfig, ChartPlan, ComposeConfig,
    ComposeRequest, EncodeInput, MediaError,
};
use dataviz_models::RenderJob;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;
use crate::logging::JobLogger;

/// Turns a job into a finished video.
///
/// Every job gets its own temporary workspace under `work_dir`, removed
/// when the render returns, whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct JobRenderer {
    config: WorkerConfig,
    chart: ChartConfig,
    compose: ComposeConfig,
}

impl JobRenderer {
    pub fn new(config: WorkerConfig) -> Self {
        let chart = config.chart_config();
        let compose = config.compose_config();
        Self {
            config,
            chart,
            compose,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Render `job`, returning the output path.
    ///
    /// Data and asset checks run before anything is drawn or encoded.
    pub async fn render(&self, job: &RenderJob) -> WorkerResult<PathBuf> {
        let logger = JobLogger::new(&job.id, "render");
        let started = Instant::now();
        logger.log_start(&job.title);

        job.ensure_valid()?;
        let plan = ChartPlan::from_job(job, &self.chart)?;

        let audio = self.config.audio_path(&job.id);
        if !audio.is_file() {
            return Err(MediaError::missing_asset(audio).into());
        }

        tokio::fs::create_dir_all(&self.config.work_dir).await?;
        let workspace = tempfile::Builder::new()
            .prefix(&format!("job_{}_", job.id))
            .tempdir_in(&self.config.work_dir)?;

        let frames_dir = workspace.path().join("frames");
        let fps = self.config.fps;
        let font_path = self.chart.font_path.clone();
        let frames = tokio::task::spawn_blocking(move || {
            let font = load_font(font_path.as_deref());
            if font.is_none() {
                tracing::warn!("No usable font found, rendering chart without text");
            }
            render_frames(&plan, &frames_dir, fps, font.as_ref())
        })
        .await??;
        logger.log_progress(&format!("{} frames rendered", frames.count));

        let staged = workspace
            .path()
            .join(crate::config::output_file_name(&job.id));
        let mut request = ComposeRequest::new(EncodeInput::Frames(frames), &audio, &staged);
        if self.config.captions && !job.analysis.trim().is_empty() {
            request = request.with_caption(&job.analysis);
        }
        compose_video(&request, &self.compose).await?;

        let output = self.config.output_path(&job.id);
        move_file(&staged, &output).await?;

        let elapsed = started.elapsed();
        metrics::histogram!("dataviz_render_seconds").record(elapsed.as_secs_f64());
        logger.log_completion(&format!(
            "{} in {:.1}s",
            output.display(),
            elapsed.as_secs_f64()
        ));

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataviz_models::{ChartData, ErrorKind, JobId};
    use tempfile::TempDir;

    fn config(root: &std::path::Path) -> WorkerConfig {
        WorkerConfig {
            work_dir: root.join("work"),
            voice_dir: root.join("outputs"),
            output_dir: root.join("output"),
            ffmpeg_bin: "/nonexistent/ffmpeg".into(),
            ..WorkerConfig::default()
        }
    }

    fn job(values: Vec<f64>) -> RenderJob {
        let labels = (0..values.len()).map(|i| format!("P{}", i)).collect();
        let mut job = RenderJob::new("Inflation", ChartData::Series { labels, values });
        job.id = JobId::from_string("20240115_083000_ab12cd34");
        job
    }

    #[tokio::test]
    async fn test_single_point_fails_validation_before_encoding() {
        let dir = TempDir::new().unwrap();
        let renderer = JobRenderer::new(config(dir.path()));

        let err = renderer.render(&job(vec![3.4])).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(!dir.path().join("work").exists());
    }

    #[tokio::test]
    async fn test_missing_audio_is_missing_asset() {
        let dir = TempDir::new().unwrap();
        let renderer = JobRenderer::new(config(dir.path()));

        let err = renderer.render(&job(vec![3.4, 3.5])).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::MissingAsset);
        assert!(err.to_string().contains("voiceover_20240115_083000_ab12cd34.mp3"));
    }

    #[tokio::test]
    async fn test_workspace_removed_after_encoder_failure() {
        let dir = TempDir::new().unwrap();
        let config = WorkerConfig {
            total_frames: 4,
            width: 108,
            height: 192,
            ..config(dir.path())
        };
        std::fs::create_dir_all(&config.voice_dir).unwrap();
        std::fs::write(
            config.audio_path(&JobId::from_string("20240115_083000_ab12cd34")),
            b"audio",
        )
        .unwrap();
        let renderer = JobRenderer::new(config);

        let err = renderer.render(&job(vec![3.4, 3.5])).await.unwrap_err();

        // the stand-in binary does not exist
        assert_eq!(err.kind(), ErrorKind::Encoding);
        let leftovers = std::fs::read_dir(dir.path().join("work")).unwrap().count();
        assert_eq!(leftovers, 0);
    }
}
