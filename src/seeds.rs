//! Seed list loading.
//!
//! The seed file is a headerless CSV; only the first column is read, blank
//! rows are skipped and the remaining order is the crawl order.

use std::io;
use std::path::Path;
use tracing::{info, instrument};

/// Read seed URLs from any CSV source.
pub fn read_seeds<R: io::Read>(reader: R) -> Result<Vec<String>, csv::Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut seeds = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if let Some(url) = record.get(0).map(str::trim).filter(|s| !s.is_empty()) {
            seeds.push(url.to_string());
        }
    }
    Ok(seeds)
}

/// Read seed URLs from the file at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_seeds(path: &Path) -> Result<Vec<String>, csv::Error> {
    let file = std::fs::File::open(path)?;
    let seeds = read_seeds(file)?;
    info!(count = seeds.len(), "Loaded seed pages");
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_seeds_first_column_in_order() {
        let input = "https://example.com/a,Videos\nhttps://example.com/b\n\n  https://example.com/c  ,x,y\n";
        let seeds = read_seeds(input.as_bytes()).unwrap();
        assert_eq!(
            seeds,
            vec!["https://example.com/a", "https://example.com/b", "https://example.com/c"]
        );
    }

    #[test]
    fn test_read_seeds_empty() {
        assert!(read_seeds("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn test_load_seeds_missing_file() {
        assert!(load_seeds(Path::new("/definitely/not/here/start_urls.csv")).is_err());
    }
}
