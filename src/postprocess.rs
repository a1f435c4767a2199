//! Turns crawled seed pages into the two output tables.
//!
//! The steps run in a fixed order:
//!
//! 1. [`flatten`]: number every entry (`sequence_id`, global) and tag it
//!    with its seed page (`group_id`); unreadable seeds contribute no rows
//!    but still consume a group number
//! 2. [`sort_descending`]: order by `(group_id, sequence_id)`, both descending
//! 3. [`drop_duplicates`]: keep the first row seen for each entry URL
//! 4. [`media_subset`]: keep rows whose media field is not `NA`
//!
//! Because deduplication runs after the descending sort, the copy that
//! survives is the one scraped *last*, from the latest seed page. Rows whose
//! media lookup failed (`Missing`) stay in the media subset; only `NA` rows
//! are left out.

use crate::models::{Row, SeedPage};
use itertools::Itertools;
use std::cmp::Reverse;
use tracing::{debug, info, instrument};

/// Both output tables, in post-deduplication sort order.
#[derive(Debug, Default)]
pub struct Tables {
    pub rows: Vec<Row>,
    pub media: Vec<Row>,
}

/// Number and flatten entries in seed order, then scrape order.
pub fn flatten(pages: &[SeedPage]) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut sequence_id = 0u32;

    for (index, page) in pages.iter().enumerate() {
        let group_id = index as u32 + 1;
        let Some(entries) = page.content.entries() else {
            debug!(category = %page.category, group_id, "Skipping unreadable seed page");
            continue;
        };

        for entry in entries {
            sequence_id += 1;
            rows.push(Row {
                sequence_id,
                group_id,
                category: page.category.clone(),
                date: entry.date.clone(),
                entry_url: entry.entry_url.clone(),
                title: entry.title.clone(),
                media_url: entry.media_url.clone(),
            });
        }
    }

    rows
}

/// Order rows newest group first, and within a group by descending
/// sequence id.
///
/// # Arguments
///
/// * `rows` - Flattened rows, sorted in place.
pub fn sort_descending(rows: &mut [Row]) {
    rows.sort_by_key(|row| Reverse((row.group_id, row.sequence_id)));
}

/// Keep only the first row for every entry URL, preserving order.
pub fn drop_duplicates(rows: Vec<Row>) -> Vec<Row> {
    rows.into_iter()
        .unique_by(|row| row.entry_url.clone())
        .collect()
}

/// Rows that belong in the media table.
///
/// # Arguments
///
/// * `rows` - Deduplicated rows in output order.
///
/// # Returns
///
/// Copies of every row whose media field is not `NA`, in the same order.
pub fn media_subset(rows: &[Row]) -> Vec<Row> {
    rows.iter().filter(|row| row.has_media()).cloned().collect()
}

/// Run the whole post-processing chain.
#[instrument(level = "info", skip_all, fields(seed_pages = pages.len()))]
pub fn build_tables(pages: &[SeedPage]) -> Tables {
    let mut rows = flatten(pages);
    let emitted = rows.len();

    sort_descending(&mut rows);
    let rows = drop_duplicates(rows);
    let media = media_subset(&rows);

    info!(
        emitted,
        kept = rows.len(),
        duplicates = emitted - rows.len(),
        with_media = media.len(),
        "Built output tables"
    );
    Tables { rows, media }
}
