//! Archive scraping: listing pagination and per-post metadata extraction.
//!
//! Scraping happens in two layers:
//!
//! 1. [`archive`]: walks a seed page's listing pages, following the
//!    load-more indicator, and returns every post found (or the missing
//!    marker when the seed is unreadable)
//! 2. [`entry`]: turns one rendered post into an [`Entry`](crate::models::Entry),
//!    substituting sentinels for anything it cannot find
//!
//! Both operate on the HTML the [`Browser`](crate::browser::Browser) session
//! returns, parsed with `scraper`.

pub mod archive;
pub mod entry;
