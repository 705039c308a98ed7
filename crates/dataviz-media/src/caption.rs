//! Burned-in narration captions built as FFmpeg `drawtext` filters.
//!
//! Caption text is data, never part of the filter syntax: it is reduced
//! to an allow-list of characters, `:` is escaped for the option parser
//! and the value is single-quoted for the graph parser. `expansion=none`
//! keeps `%` literal.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{MediaError, MediaResult};

/// Punctuation kept in captions besides letters, digits and spaces.
const ALLOWED_PUNCTUATION: &[char] = &[
    '.', ',', '!', '?', '-', '+', '%', '$', '&', '(', ')', '/', '#', '@', '*', '"', ':',
];

/// Look of the caption block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionStyle {
    pub font_size: u32,
    pub font_color: String,
    pub box_color: String,
    pub box_border: u32,
    /// Wrap width in characters
    pub max_chars_per_line: usize,
    /// Lines beyond this are cut and the last one ends with "..."
    pub max_lines: usize,
    /// Distance from the bottom edge to the last line
    pub bottom_margin: u32,
    pub line_spacing: u32,
    pub font_file: Option<PathBuf>,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size: 34,
            font_color: "white".to_string(),
            box_color: "black@0.5".to_string(),
            box_border: 12,
            max_chars_per_line: 30,
            max_lines: 10,
            bottom_margin: 240,
            line_spacing: 22,
            font_file: None,
        }
    }
}

impl CaptionStyle {
    pub fn with_font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_file = Some(path.into());
        self
    }

    fn line_height(&self) -> u32 {
        self.font_size + self.line_spacing
    }
}

/// Reduce caption text to characters that are safe inside a drawtext value.
///
/// Newlines and tabs become spaces, runs of spaces collapse, and anything
/// outside the allow-list (quotes, backslashes, brackets, `;`, `=`) is
/// dropped.
pub fn sanitize_caption(text: &str) -> String {
    let kept: String = text
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| *c == ' ' || c.is_alphanumeric() || ALLOWED_PUNCTUATION.contains(c))
        .collect();

    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap. Words longer than `width` are split.
pub fn wrap_caption(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Build one `drawtext` filter per caption line, bottom line last.
///
/// Returns an empty list when nothing printable is left after sanitizing.
pub fn build_caption_filters(text: &str, style: &CaptionStyle) -> MediaResult<Vec<String>> {
    let clean = sanitize_caption(text);
    if clean.is_empty() {
        return Ok(Vec::new());
    }

    let mut lines = wrap_caption(&clean, style.max_chars_per_line);
    if lines.len() > style.max_lines {
        lines.truncate(style.max_lines);
        if let Some(last) = lines.last_mut() {
            ellipsize(last, style.max_chars_per_line);
        }
    }

    let font_opt = match &style.font_file {
        Some(path) => {
            let path = path.to_string_lossy();
            if path.contains(['\'', '\\']) {
                return Err(MediaError::validation(format!(
                    "caption font path cannot be quoted safely: {}",
                    path
                )));
            }
            format!(":fontfile='{}'", escape_option_value(&path))
        }
        None => String::new(),
    };

    let count = lines.len() as u32;
    let filters = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let offset = style.bottom_margin + (count - 1 - i as u32) * style.line_height();
            format!(
                "drawtext=text='{}':expansion=none{}:fontcolor={}:fontsize={}:x=(w-text_w)/2:y=h-{}-text_h:box=1:boxcolor={}:boxborderw={}",
                escape_option_value(line),
                font_opt,
                style.font_color,
                style.font_size,
                offset,
                style.box_color,
                style.box_border,
            )
        })
        .collect();

    Ok(filters)
}

/// Mark a cut caption with `...` without growing past `width` chars.
fn ellipsize(line: &mut String, width: usize) {
    const ELLIPSIS: &str = "...";
    let kept: String = line
        .chars()
        .take(width.saturating_sub(ELLIPSIS.len()))
        .collect();
    let mut cut = kept.trim_end().to_string();
    let room = width - cut.chars().count();
    cut.extend(ELLIPSIS.chars().take(room));
    *line = cut;
}

/// Escape the option-level separator.
fn escape_option_value(value: &str) -> String {
    value.replace(':', "\\:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_drops_metacharacters() {
        let raw = "It's up 5%: [big] day;\nsee\\you = {now}";
        assert_eq!(sanitize_caption(raw), "Its up 5%: big day seeyou now");
    }

    #[test]
    fn test_sanitize_keeps_prices_and_unicode_letters() {
        assert_eq!(
            sanitize_caption("Bitcoin   jumped 2.5% to $43,500 (café)"),
            "Bitcoin jumped 2.5% to $43,500 (café)"
        );
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap_caption(
            "Bitcoin jumped 2.5% today, moving from $42,000 to $43,500 as traders cheer",
            30,
        );
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 30));
        assert_eq!(lines[0], "Bitcoin jumped 2.5% today,");
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let lines = wrap_caption("aaaaaaaaaa bb", 4);
        assert_eq!(lines, vec!["aaaa", "aaaa", "aa", "bb"]);
    }

    #[test]
    fn test_filters_escape_colon_and_quote_value() {
        let filters = build_caption_filters("Ratio 3:1 today", &CaptionStyle::default()).unwrap();
        assert_eq!(filters.len(), 1);
        assert!(filters[0].starts_with("drawtext=text='Ratio 3\\:1 today':expansion=none:"));
        assert!(filters[0].contains("x=(w-text_w)/2"));
    }

    #[test]
    fn test_filters_never_contain_stray_quotes() {
        let filters =
            build_caption_filters("Don't panic; it's 'fine'\n[ok]", &CaptionStyle::default()).unwrap();
        for filter in &filters {
            // Only the two delimiting quotes around text (no fontfile set)
            assert_eq!(filter.matches('\'').count(), 2);
            assert!(!filter.contains(';') && !filter.contains('['));
        }
    }

    #[test]
    fn test_lines_stack_upwards() {
        let style = CaptionStyle {
            max_chars_per_line: 10,
            ..CaptionStyle::default()
        };
        let filters = build_caption_filters("first line second line", &style).unwrap();
        assert_eq!(filters.len(), 3);
        assert!(filters[2].contains(&format!("y=h-{}-text_h", style.bottom_margin)));
        assert!(filters[0].contains(&format!(
            "y=h-{}-text_h",
            style.bottom_margin + 2 * style.line_height()
        )));
    }

    #[test]
    fn test_too_many_lines_are_cut() {
        let style = CaptionStyle {
            max_chars_per_line: 5,
            max_lines: 2,
            ..CaptionStyle::default()
        };
        let filters = build_caption_filters("one two three four", &style).unwrap();
        assert_eq!(filters.len(), 2);
        assert!(filters[1].contains("text='tw...'"));
    }

    #[test]
    fn test_ellipsis_stays_within_line_width() {
        let style = CaptionStyle {
            max_chars_per_line: 12,
            max_lines: 1,
            ..CaptionStyle::default()
        };
        let filters =
            build_caption_filters("Markets rally hard as yields fall", &style).unwrap();
        assert_eq!(filters.len(), 1);
        assert!(filters[0].contains("text='Markets...'"));

        let mut short = "one".to_string();
        ellipsize(&mut short, 30);
        assert_eq!(short, "one...");

        let mut exact = "abcdefghij".to_string();
        ellipsize(&mut exact, 10);
        assert_eq!(exact, "abcdefg...");
        assert_eq!(exact.chars().count(), 10);
    }

    #[test]
    fn test_empty_caption_yields_no_filters() {
        assert!(build_caption_filters(" ';[] ", &CaptionStyle::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_unquotable_font_path_rejected() {
        let style = CaptionStyle::default().with_font_file("/fonts/it's.ttf");
        assert!(matches!(
            build_caption_filters("hello", &style),
            Err(MediaError::Validation(_))
        ));
    }
}
