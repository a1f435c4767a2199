//! CSV tables of numbered, deduplicated rows.
//!
//! Two tables share one layout: every kept row, and the media subset. The
//! header row is optional so the output can match headerless consumers.

use crate::models::Row;
use std::error::Error;
use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Column order of both tables.
pub const COLUMNS: [&str; 7] = [
    "sequenceId",
    "groupId",
    "category",
    "date",
    "entryUrl",
    "title",
    "mediaUrl",
];

/// Write `rows` as CSV to any writer.
pub fn write_rows<W: io::Write>(rows: &[Row], writer: W, headers: bool) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    if headers {
        wtr.write_record(COLUMNS)?;
    }
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `rows` to a CSV file at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = rows.len()))]
pub async fn write_table(rows: &[Row], path: &Path, headers: bool) -> Result<(), Box<dyn Error>> {
    let mut buf = Vec::new();
    write_rows(rows, &mut buf, headers)?;
    fs::write(path, buf).await?;
    info!("Wrote CSV table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row {
            sequence_id: 7,
            group_id: 2,
            category: "https://example.com/cat".to_string(),
            date: "June 3, 2016".to_string(),
            entry_url: "https://example.com/p/".to_string(),
            title: "Statement, part 2".to_string(),
            media_url: "Missing".to_string(),
        }
    }

    #[test]
    fn test_write_rows_with_header() {
        let mut buf = Vec::new();
        write_rows(&[row()], &mut buf, true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "sequenceId,groupId,category,date,entryUrl,title,mediaUrl");
        assert_eq!(
            lines[1],
            "7,2,https://example.com/cat,\"June 3, 2016\",https://example.com/p/,\"Statement, part 2\",Missing"
        );
    }

    #[test]
    fn test_write_rows_without_header() {
        let mut buf = Vec::new();
        write_rows(&[row()], &mut buf, false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("7,2,"));
    }

    #[test]
    fn test_header_written_for_empty_table() {
        let mut buf = Vec::new();
        write_rows(&[], &mut buf, true).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim_end(), COLUMNS.join(","));
    }
}
