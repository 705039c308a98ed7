//! Frame export: one numbered PNG per planned frame.

use rusttype::Font;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

use crate::chart::{ChartPlan, FrameRasterizer};
use crate::error::{MediaError, MediaResult};

/// printf-style pattern understood by FFmpeg's image2 demuxer.
pub const FRAME_PATTERN: &str = "frame_%05d.png";

/// Frames written to disk, ready to be read back as an image sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSequence {
    pub dir: PathBuf,
    pub count: usize,
    pub fps: u32,
}

impl FrameSequence {
    /// Path of frame `index` inside `dir`.
    pub fn frame_path(dir: &Path, index: usize) -> PathBuf {
        dir.join(format!("frame_{:05}.png", index))
    }

    /// Input pattern for `-i`.
    pub fn pattern(&self) -> PathBuf {
        self.dir.join(FRAME_PATTERN)
    }

    /// Playback length at `fps`.
    pub fn duration_secs(&self) -> f64 {
        if self.fps == 0 {
            return 0.0;
        }
        self.count as f64 / self.fps as f64
    }

    /// Check that every frame file is present.
    ///
    /// The image2 demuxer stops at the first gap, so a hole anywhere in
    /// the numbering would silently shorten the video.
    pub fn verify(&self) -> MediaResult<()> {
        if self.count == 0 {
            return Err(MediaError::validation("frame sequence is empty"));
        }
        match (0..self.count)
            .map(|index| Self::frame_path(&self.dir, index))
            .find(|path| !path.is_file())
        {
            Some(missing) => Err(MediaError::missing_asset(missing)),
            None => Ok(()),
        }
    }
}

/// Rasterize every frame of `plan` into `dir`.
///
/// Blocking: call through `tokio::task::spawn_blocking` from async code.
pub fn render_frames(
    plan: &ChartPlan,
    dir: &Path,
    fps: u32,
    font: Option<&Font<'_>>,
) -> MediaResult<FrameSequence> {
    if fps == 0 {
        return Err(MediaError::validation("fps must be positive"));
    }
    std::fs::create_dir_all(dir)?;

    let started = Instant::now();
    let raster = FrameRasterizer::new(plan, font);

    let mut count = 0;
    for frame in plan.frames() {
        let img = raster.render(&frame);
        img.save(FrameSequence::frame_path(dir, frame.index))?;
        count += 1;
        if count % 30 == 0 {
            debug!(frames = count, total = plan.total_frames(), "Rendering frames");
        }
    }

    let elapsed = started.elapsed();
    metrics::histogram!("dataviz_frame_render_seconds").record(elapsed.as_secs_f64());
    info!(
        frames = count,
        dir = %dir.display(),
        elapsed_ms = elapsed.as_millis() as u64,
        "Rendered frame sequence"
    );

    Ok(FrameSequence {
        dir: dir.to_path_buf(),
        count,
        fps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartConfig;
    use dataviz_models::Series;
    use tempfile::TempDir;

    #[test]
    fn test_writes_one_file_per_frame() {
        let dir = TempDir::new().unwrap();
        let frames_dir = dir.path().join("frames");
        let config = ChartConfig {
            width: 108,
            height: 192,
            total_frames: 12,
            ..ChartConfig::default()
        };
        let series = Series::new(
            vec!["Jan".into(), "Feb".into(), "Mar".into()],
            vec![3.4, 3.2, 3.5],
        );
        let plan = ChartPlan::new("Inflation", "Fed", &series, &config).unwrap();

        let seq = render_frames(&plan, &frames_dir, 30, None).unwrap();

        assert_eq!(seq.count, 12);
        assert!(seq.verify().is_ok());
        assert!(frames_dir.join("frame_00011.png").is_file());
        assert!(!frames_dir.join("frame_00012.png").exists());
        assert_eq!(seq.pattern(), frames_dir.join("frame_%05d.png"));

        let img = image::open(frames_dir.join("frame_00000.png")).unwrap();
        assert_eq!((img.width(), img.height()), (108, 192));
    }

    #[test]
    fn test_verify_reports_missing_frames() {
        let seq = FrameSequence {
            dir: PathBuf::from("/nonexistent/frames"),
            count: 3,
            fps: 30,
        };
        assert!(matches!(seq.verify(), Err(MediaError::MissingAsset(_))));
        assert!((seq.duration_secs() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_verify_catches_gap_in_the_middle() {
        let dir = TempDir::new().unwrap();
        for index in [0, 1, 3, 4] {
            std::fs::write(FrameSequence::frame_path(dir.path(), index), b"png").unwrap();
        }
        let seq = FrameSequence {
            dir: dir.path().to_path_buf(),
            count: 5,
            fps: 30,
        };

        match seq.verify() {
            Err(MediaError::MissingAsset(path)) => assert!(path.ends_with("frame_00002.png")),
            other => panic!("expected missing frame 2, got {other:?}"),
        }
    }
}
