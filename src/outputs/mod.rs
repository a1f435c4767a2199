//! Output generation for crawl results and tables.
//!
//! # Submodules
//!
//! - [`json`]: Dumps the raw per-seed crawl results
//! - [`table`]: Writes the deduplicated row tables as CSV
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── archive.json        # raw crawl results, one record per seed page
//! ├── archive.csv         # every deduplicated row
//! └── archive_media.csv   # rows whose media field is not NA
//! ```

pub mod json;
pub mod table;
