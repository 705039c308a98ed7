//! FFmpeg progress reporting.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Snapshot of an encode in flight, parsed from `-progress pipe:2`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FfmpegProgress {
    /// Frames written so far
    pub frame: u64,
    /// Current encode FPS
    pub fps: f64,
    /// Output time in milliseconds
    pub out_time_ms: i64,
    /// Output time as string (HH:MM:SS.microseconds)
    pub out_time: String,
    /// Encoding speed relative to realtime
    pub speed: f64,
    /// Whether encoding is complete
    pub is_complete: bool,
}

impl FfmpegProgress {
    /// Completion percentage against the expected output length.
    pub fn percentage(&self, expected: Duration) -> f64 {
        let total_ms = expected.as_millis() as f64;
        if total_ms <= 0.0 {
            return 0.0;
        }
        ((self.out_time_ms as f64 / total_ms) * 100.0).clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = FfmpegProgress {
            out_time_ms: 3500,
            ..Default::default()
        };

        assert!((progress.percentage(Duration::from_secs(7)) - 50.0).abs() < 0.01);
        assert!((progress.percentage(Duration::from_secs(2)) - 100.0).abs() < 0.01);
        assert_eq!(progress.percentage(Duration::ZERO), 0.0);
    }
}
