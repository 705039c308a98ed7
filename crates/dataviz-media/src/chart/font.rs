//! TrueType font lookup for chart text.

use rusttype::Font;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Common locations checked when no font is configured.
const FONT_SEARCH_PATHS: &[&str] = &[
    "assets/fonts/chart.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
];

/// Find a usable font file.
///
/// A configured path wins when it exists; otherwise the first hit from the
/// search list is returned.
pub fn resolve_font_path(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = configured {
        if path.is_file() {
            return Some(path.to_path_buf());
        }
        warn!(path = %path.display(), "Configured font not found, searching system fonts");
    }

    FONT_SEARCH_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

/// Load the font at the resolved path, if any.
pub fn load_font(configured: Option<&Path>) -> Option<Font<'static>> {
    let path = resolve_font_path(configured)?;
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(path = %path.display(), "Failed to read font: {}", e);
            return None;
        }
    };

    match Font::try_from_vec(bytes) {
        Some(font) => {
            debug!(path = %path.display(), "Loaded chart font");
            Some(font)
        }
        None => {
            warn!(path = %path.display(), "File is not a usable TrueType font");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_configured_font_wins() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("custom.ttf");
        std::fs::write(&font, b"not really a font").unwrap();
        assert_eq!(resolve_font_path(Some(font.as_path())), Some(font.clone()));
    }

    #[test]
    fn test_invalid_font_is_skipped() {
        let dir = TempDir::new().unwrap();
        let font = dir.path().join("broken.ttf");
        std::fs::write(&font, b"garbage").unwrap();
        assert!(load_font(Some(font.as_path())).is_none());
    }
}
