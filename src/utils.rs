//! Helpers for log formatting and output paths.

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Truncate a string for logging purposes.
///
/// Cuts at a character boundary at or below `max` bytes and appends the
/// number of bytes dropped.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Create the parent directory of `path` if it doesn't exist.
#[instrument(level = "debug", skip_all, fields(%path))]
pub async fn ensure_parent_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
            debug!(parent = %parent.display(), "Output directory ready");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.ends_with("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // Two bytes per Cyrillic letter; a cut at 3 lands mid-character.
        let result = truncate_for_log("Поезд", 3);
        assert_eq!(result, "П…(+8 bytes)");
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_bare_filename() {
        ensure_parent_dir("feed.jsonl").await.unwrap();
    }

    #[tokio::test]
    async fn test_ensure_parent_dir_creates_nested() {
        let root = std::env::temp_dir().join(format!("railway_news_utils_{}", std::process::id()));
        let file = root.join("a").join("b").join("out.json");
        ensure_parent_dir(file.to_str().unwrap()).await.unwrap();
        assert!(root.join("a").join("b").is_dir());
        let _ = tokio::fs::remove_dir_all(&root).await;
    }
}
