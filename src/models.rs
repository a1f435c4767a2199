//! Data models for scraped archive entries and their tabular projection.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Entry`]: Metadata extracted from one rendered archive post
//! - [`CrawlOutcome`]: Everything one seed page yielded, or the missing marker
//! - [`SeedPage`]: A seed URL paired with its crawl outcome
//! - [`Row`]: One flattened, numbered line of the output tables
//!
//! Absent values are represented by the reserved strings [`MISSING`] and
//! [`NOT_AVAILABLE`] so they survive serialization unchanged.

use serde::{Serialize, Serializer};

/// A lookup failed: the element was expected but could not be located.
pub const MISSING: &str = "Missing";

/// The media field is intentionally absent (no frame, or a widget frame).
pub const NOT_AVAILABLE: &str = "NA";

/// Metadata extracted from one archive post.
///
/// Every field is always populated; failed lookups hold [`MISSING`], and
/// `media_url` may additionally hold [`NOT_AVAILABLE`].
///
/// Serialized with the key names of the intermediate JSON file, where the
/// media address is called `video_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Publish date text as displayed on the page, not parsed.
    pub date: String,
    /// Post title.
    pub title: String,
    /// Absolute URL of the post's own page.
    pub entry_url: String,
    /// Source of the embedded media frame.
    #[serde(rename = "video_url")]
    pub media_url: String,
}

/// What crawling one seed page produced.
///
/// Crawling is all-or-nothing per seed page: if any page of the listing is
/// unreadable the accumulated entries are thrown away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    /// Entries from every listing page, in page order.
    Entries(Vec<Entry>),
    /// The seed page could not be read.
    Missing,
}

impl CrawlOutcome {
    /// The scraped entries, or `None` for an unreadable seed.
    pub fn entries(&self) -> Option<&[Entry]> {
        match self {
            CrawlOutcome::Entries(entries) => Some(entries),
            CrawlOutcome::Missing => None,
        }
    }

    /// Whether the seed page could not be read.
    pub fn is_missing(&self) -> bool {
        matches!(self, CrawlOutcome::Missing)
    }
}

impl Serialize for CrawlOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CrawlOutcome::Entries(entries) => entries.serialize(serializer),
            CrawlOutcome::Missing => serializer.serialize_str(MISSING),
        }
    }
}

/// A seed URL and the result of crawling it.
///
/// The seed URL doubles as the category label of every row it produces.
#[derive(Debug, Clone, Serialize)]
pub struct SeedPage {
    pub category: String,
    pub content: CrawlOutcome,
}

/// One line of the output tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Global 1-based number in emission order; also names the media file.
    pub sequence_id: u32,
    /// 1-based number of the seed page this row came from.
    pub group_id: u32,
    pub category: String,
    pub date: String,
    pub entry_url: String,
    pub title: String,
    pub media_url: String,
}

impl Row {
    /// Whether the row belongs to the media table.
    ///
    /// Only the explicit [`NOT_AVAILABLE`] marker excludes a row; rows whose
    /// media lookup failed ([`MISSING`]) are kept.
    pub fn has_media(&self) -> bool {
        self.media_url != NOT_AVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(url: &str, media: &str) -> Entry {
        Entry {
            date: "December 1, 2015".to_string(),
            title: "A post".to_string(),
            entry_url: url.to_string(),
            media_url: media.to_string(),
        }
    }

    #[test]
    fn test_entry_serializes_with_video_url_key() {
        let json = serde_json::to_value(entry("https://example.com/p", "https://v.example/1")).unwrap();
        assert_eq!(json["entry_url"], "https://example.com/p");
        assert_eq!(json["video_url"], "https://v.example/1");
        assert!(json.get("media_url").is_none());
    }

    #[test]
    fn test_missing_outcome_serializes_as_marker_string() {
        let page = SeedPage {
            category: "https://example.com/cat".to_string(),
            content: CrawlOutcome::Missing,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["category"], "https://example.com/cat");
        assert_eq!(json["content"], "Missing");
    }

    #[test]
    fn test_entries_outcome_serializes_as_list() {
        let outcome = CrawlOutcome::Entries(vec![entry("a", "NA"), entry("b", "NA")]);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(outcome.entries().map(<[Entry]>::len), Some(2));
        assert!(!outcome.is_missing());
        assert!(CrawlOutcome::Missing.entries().is_none());
    }

    #[test]
    fn test_has_media_excludes_only_not_available() {
        let mut row = Row {
            sequence_id: 1,
            group_id: 1,
            category: "c".to_string(),
            date: MISSING.to_string(),
            entry_url: "u".to_string(),
            title: "t".to_string(),
            media_url: NOT_AVAILABLE.to_string(),
        };
        assert!(!row.has_media());

        row.media_url = MISSING.to_string();
        assert!(row.has_media());

        row.media_url = "https://player.example/v/1".to_string();
        assert!(row.has_media());
    }
}
