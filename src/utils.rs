//! Utility functions shared by both binaries.
//!
//! This module provides helper functions used throughout the application:
//! - Tracing subscriber setup
//! - String truncation for logging raw markup
//! - Question normalization for duplicate detection
//! - File system validation for output files

use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

/// Install the global tracing subscriber.
///
/// The filter comes from `RUST_LOG` and falls back to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to at most `max` bytes (backing off to the
/// nearest character boundary) with an ellipsis and byte count appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
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

/// Lower-case and trim a question so two spellings of the same text compare equal.
pub fn normalize_question(question: &str) -> String {
    question.trim().to_lowercase()
}

/// Ensure the directory that will hold `file` exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file
/// next to the target.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(file = %file.display()))]
pub async fn ensure_writable_parent(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let probe_path = dir.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!(dir = %dir.display(), "Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // Each Cyrillic letter is two bytes; byte 3 is mid-character.
        let result = truncate_for_log("собака", 3);
        assert!(result.starts_with("с…"));
        assert!(result.contains("(+10 bytes)"));
    }

    #[test]
    fn test_normalize_question() {
        assert_eq!(normalize_question("  Name A Pet  "), "name a pet");
        assert_eq!(normalize_question("ВОПРОС"), "вопрос");
        assert_eq!(normalize_question(""), "");
    }

    #[tokio::test]
    async fn test_ensure_writable_parent_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("nested").join("data.json");
        ensure_writable_parent(&file).await.unwrap();
        assert!(dir.path().join("nested").is_dir());
        assert!(!dir.path().join("nested").join("..__probe_write__").exists());
    }
}
