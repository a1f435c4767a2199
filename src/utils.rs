//! Utility functions for logging, output naming and file system checks.

use std::error::Error;
use std::fs as stdfs;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` bytes (backing off to a character
/// boundary) with an ellipsis and byte count appended.
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

/// Paths of the three files one run writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub rows: PathBuf,
    pub media: PathBuf,
}

impl OutputPaths {
    /// Build the output paths for a run.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory the files are written into.
    /// * `prefix` - File stem shared by all three outputs.
    ///
    /// # Returns
    ///
    /// `{prefix}.json`, `{prefix}.csv` and `{prefix}_media.csv` inside `dir`.
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            json: dir.join(format!("{prefix}.json")),
            rows: dir.join(format!("{prefix}.csv")),
            media: dir.join(format!("{prefix}_media.csv")),
        }
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = path.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!("Directory is writable");
    Ok(())
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
    fn test_truncate_for_log_respects_char_boundary() {
        let result = truncate_for_log("ééé", 3);
        assert_eq!(result, "é…(+4 bytes)");
    }

    #[test]
    fn test_output_paths() {
        let paths = OutputPaths::new(Path::new("out"), "archive");
        assert_eq!(paths.json, PathBuf::from("out/archive.json"));
        assert_eq!(paths.rows, PathBuf::from("out/archive.csv"));
        assert_eq!(paths.media, PathBuf::from("out/archive_media.csv"));
    }

    #[tokio::test]
    async fn test_ensure_writable_dir_creates_directory() {
        let dir = std::env::temp_dir().join(format!("archive_harvest_probe_{}", std::process::id()));
        ensure_writable_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
        assert!(!dir.join("..__probe_write__").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
