//! Colours used by the renderer.

use image::Rgb;
use serde::{Deserialize, Serialize};

pub const BACKGROUND: Rgb<u8> = Rgb([0x05, 0x05, 0x05]);
pub const GRID: Rgb<u8> = Rgb([0x33, 0x33, 0x33]);
pub const TEXT: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
pub const MUTED: Rgb<u8> = Rgb([0xAA, 0xAA, 0xAA]);
pub const CITATION: Rgb<u8> = Rgb([0x66, 0x66, 0x66]);

const POSITIVE: Rgb<u8> = Rgb([0x00, 0xFF, 0x88]);
const NEGATIVE: Rgb<u8> = Rgb([0xFF, 0x4D, 0x4D]);

/// Accent colour chosen once per job from the overall trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPalette {
    Positive,
    Negative,
}

impl TrendPalette {
    /// Positive iff the series ends at or above where it started.
    pub fn from_endpoints(first: f64, last: f64) -> Self {
        if last >= first {
            TrendPalette::Positive
        } else {
            TrendPalette::Negative
        }
    }

    pub fn for_values(values: &[f64]) -> Self {
        match (values.first(), values.last()) {
            (Some(first), Some(last)) => Self::from_endpoints(*first, *last),
            _ => TrendPalette::Positive,
        }
    }

    pub fn accent(&self) -> Rgb<u8> {
        match self {
            TrendPalette::Positive => POSITIVE,
            TrendPalette::Negative => NEGATIVE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trend_rule() {
        assert_eq!(TrendPalette::from_endpoints(3.4, 3.5), TrendPalette::Positive);
        assert_eq!(TrendPalette::from_endpoints(3.4, 3.4), TrendPalette::Positive);
        assert_eq!(TrendPalette::from_endpoints(3.2, 3.0), TrendPalette::Negative);
    }

    #[test]
    fn test_only_endpoints_matter() {
        // dips in the middle do not change the palette
        let palette = TrendPalette::for_values(&[10.0, -500.0, 10.0]);
        assert_eq!(palette, TrendPalette::Positive);
        assert_eq!(palette.accent(), Rgb([0x00, 0xFF, 0x88]));
    }
}
