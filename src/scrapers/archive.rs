//! Paginated listing crawler.
//!
//! A seed page is a category listing. Each listing page holds its posts in
//! `#posts-container` as `article` elements, and carries an
//! `#infinite-handle` element while more pages exist. Further pages live at
//! `{seed}/page/{n}/` with `n` counting from 2.
//!
//! Crawling a seed is all-or-nothing: if any page cannot be loaded or has no
//! entries container, the seed's result is [`CrawlOutcome::Missing`] and the
//! entries gathered from earlier pages are dropped.

use crate::browser::Browser;
use crate::error::{BrowserError, PageError};
use crate::models::{CrawlOutcome, Entry};
use crate::scrapers::entry::extract_entry;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

static POSTS_CONTAINER: Lazy<Selector> = Lazy::new(|| Selector::parse("#posts-container").unwrap());
static ARTICLE: Lazy<Selector> = Lazy::new(|| Selector::parse("article").unwrap());
static LOAD_MORE: Lazy<Selector> = Lazy::new(|| Selector::parse("#infinite-handle").unwrap());

/// Knobs for crawling one seed page.
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Frames whose `src` matches this are recorded as having no media.
    pub widget_pattern: Regex,
    /// Stop after this many listing pages even if more are advertised.
    pub max_pages: Option<u32>,
}

/// Entries found on one listing page.
#[derive(Debug)]
struct Listing {
    entries: Vec<Entry>,
    has_more: bool,
}

/// URL of listing page `page` (2 or more) below `seed_url`.
pub fn page_url(seed_url: &str, page: u32) -> String {
    format!("{}/page/{}/", seed_url.trim_end_matches('/'), page)
}

/// Crawl every listing page of `seed_url`.
///
/// Never fails: an unreadable seed is logged and reported as
/// [`CrawlOutcome::Missing`].
#[instrument(level = "info", skip(browser, options))]
pub async fn crawl<B: Browser>(browser: &mut B, seed_url: &str, options: &CrawlOptions) -> CrawlOutcome {
    match crawl_pages(browser, seed_url, options).await {
        Ok(entries) => {
            info!(count = entries.len(), "Crawled seed page");
            CrawlOutcome::Entries(entries)
        }
        Err(e) => {
            error!(error = %e, "Seed page unreadable; discarding its entries");
            CrawlOutcome::Missing
        }
    }
}

async fn crawl_pages<B: Browser>(
    browser: &mut B,
    seed_url: &str,
    options: &CrawlOptions,
) -> Result<Vec<Entry>, PageError> {
    let mut entries = Vec::new();
    let mut page = 1u32;
    let mut url = seed_url.to_string();

    loop {
        let html = load(browser, &url).await?;
        let listing = parse_listing(&html, &url, &options.widget_pattern)?;
        debug!(page, %url, count = listing.entries.len(), "Parsed listing page");
        entries.extend(listing.entries);

        if !listing.has_more {
            info!(pages = page, "Load-more indicator absent; listing exhausted");
            break;
        }
        if options.max_pages.is_some_and(|max| page >= max) {
            warn!(pages = page, "Page limit reached; more pages were advertised");
            break;
        }

        page += 1;
        url = page_url(seed_url, page);
    }

    Ok(entries)
}

async fn load<B: Browser>(browser: &mut B, url: &str) -> Result<String, PageError> {
    let to_page_error = |source: BrowserError| PageError::Load {
        url: url.to_string(),
        source,
    };
    browser.navigate(url).await.map_err(to_page_error)?;
    browser.page_source().await.map_err(to_page_error)
}

fn parse_listing(html: &str, url: &str, widget: &Regex) -> Result<Listing, PageError> {
    let base = match Url::parse(url) {
        Ok(base) => Some(base),
        Err(e) => {
            debug!(%url, error = %e, "Page URL is not absolute; keeping links as found");
            None
        }
    };
    let document = Html::parse_document(html);

    let container = document
        .select(&POSTS_CONTAINER)
        .next()
        .ok_or_else(|| PageError::NoContainer {
            url: url.to_string(),
        })?;

    let entries = container
        .select(&ARTICLE)
        .map(|article| extract_entry(article, base.as_ref(), widget))
        .collect();
    let has_more = document.select(&LOAD_MORE).next().is_some();

    Ok(Listing { entries, has_more })
}
