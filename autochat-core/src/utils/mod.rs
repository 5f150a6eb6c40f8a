//! Utility functions and helpers

use std::path::PathBuf;

/// Ellipsis appended to every preview
pub const PREVIEW_SUFFIX: &str = "...";

/// First `max_chars` characters of `text` followed by an ellipsis.
///
/// The ellipsis is appended even when nothing was cut off.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    out.push_str(PREVIEW_SUFFIX);
    out
}

/// Expand a leading `~/` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
