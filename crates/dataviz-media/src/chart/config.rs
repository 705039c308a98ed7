//! Renderer configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use dataviz_models::encoding::{PORTRAIT_HEIGHT, PORTRAIT_WIDTH};

use crate::error::{MediaError, MediaResult};

/// Frames per job when nothing else is configured (3 s at 30 fps).
pub const DEFAULT_TOTAL_FRAMES: usize = 90;

/// Renderer settings passed explicitly into every render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Frames per job, independent of the number of data points
    pub total_frames: usize,
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Y-axis padding as a fraction of the value range
    pub padding_ratio: f64,
    /// Stroke width of the data line
    pub line_width: u32,
    /// Maximum number of visible x-axis labels
    pub max_tick_labels: usize,
    /// TrueType font; system locations are searched when unset
    pub font_path: Option<PathBuf>,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            total_frames: DEFAULT_TOTAL_FRAMES,
            width: PORTRAIT_WIDTH,
            height: PORTRAIT_HEIGHT,
            padding_ratio: 0.2,
            line_width: 8,
            max_tick_labels: 12,
            font_path: None,
        }
    }
}

impl ChartConfig {
    pub fn with_total_frames(mut self, total_frames: usize) -> Self {
        self.total_frames = total_frames;
        self
    }

    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    /// Reject settings that cannot produce a meaningful animation.
    pub fn validate(&self) -> MediaResult<()> {
        if self.total_frames < 2 {
            return Err(MediaError::validation(format!(
                "total_frames must be at least 2, got {}",
                self.total_frames
            )));
        }
        if self.width < 64 || self.height < 64 {
            return Err(MediaError::validation(format!(
                "canvas {}x{} is too small",
                self.width, self.height
            )));
        }
        if !(self.padding_ratio > 0.0 && self.padding_ratio <= 1.0) {
            return Err(MediaError::validation(format!(
                "padding_ratio must be in (0, 1], got {}",
                self.padding_ratio
            )));
        }
        if self.line_width == 0 || self.max_tick_labels == 0 {
            return Err(MediaError::validation(
                "line_width and max_tick_labels must be positive",
            ));
        }
        Ok(())
    }
}
