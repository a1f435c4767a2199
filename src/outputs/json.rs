//! Intermediate JSON dump of the raw crawl results.
//!
//! Written once, after every seed page has been crawled and before any
//! post-processing, so the raw scrape survives even if later stages change.
//!
//! # Output Structure
//!
//! ```text
//! [
//!     {
//!         "category": "https://archive.example.org/category/videos",
//!         "content": [
//!             { "date": "...", "title": "...", "entry_url": "...", "video_url": "..." }
//!         ]
//!     },
//!     { "category": "https://archive.example.org/category/broken", "content": "Missing" }
//! ]
//! ```

use crate::models::SeedPage;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Serialize seed pages as a JSON array indented with four spaces.
pub fn to_json(pages: &[SeedPage]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    pages.serialize(&mut serializer)?;
    Ok(buf)
}

/// Write the crawl results to `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_seed_pages(pages: &[SeedPage], path: &Path) -> Result<(), Box<dyn Error>> {
    let json = to_json(pages)?;
    fs::write(path, json).await?;
    info!(seed_pages = pages.len(), "Wrote crawl results JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CrawlOutcome, Entry};

    #[test]
    fn test_to_json_layout() {
        let pages = vec![
            SeedPage {
                category: "https://example.com/a".to_string(),
                content: CrawlOutcome::Entries(vec![Entry {
                    date: "May 6, 2016".to_string(),
                    title: "Post".to_string(),
                    entry_url: "https://example.com/post/".to_string(),
                    media_url: "NA".to_string(),
                }]),
            },
            SeedPage {
                category: "https://example.com/b".to_string(),
                content: CrawlOutcome::Missing,
            },
        ];

        let bytes = to_json(&pages).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\n    {\n        \"category\": \"https://example.com/a\""));
        assert!(text.contains("\"content\": \"Missing\""));

        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["content"][0]["video_url"], "NA");
        assert_eq!(value[0]["content"][0]["entry_url"], "https://example.com/post/");
    }

    #[test]
    fn test_to_json_empty() {
        assert_eq!(to_json(&[]).unwrap(), b"[]");
    }
}
