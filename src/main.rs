//! # Archive Harvest
//!
//! A batch scraper for paginated post archives. It walks each seed listing
//! page through a browser session, extracts per-post metadata, tabulates and
//! deduplicates the results, and optionally downloads embedded media.
//!
//! ## Usage
//!
//! ```sh
//! archive_harvest -s start_urls.csv -o ./out -d ./videos --driver-path /usr/local/bin/chromedriver
//! ```
//!
//! ## Architecture
//!
//! The application is a straight pipeline sharing one browser session:
//! 1. **Crawling**: Walk every seed page's listing pages and extract entries
//! 2. **Dumping**: Write the raw per-seed results as JSON
//! 3. **Tabulating**: Number, sort, deduplicate and split rows into two CSV tables
//! 4. **Downloading**: Visit each media row's page and save its video

use clap::Parser;
use regex::Regex;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod cli;
mod download;
mod error;
mod models;
mod outputs;
mod postprocess;
mod scrapers;
mod seeds;
mod utils;

use browser::{Browser, DriverOptions, HttpSession, Paced, Session, WebDriverSession};
use cli::{Backend, Cli};
use models::SeedPage;
use outputs::{json, table};
use scrapers::archive::{CrawlOptions, crawl};
use utils::{OutputPaths, ensure_writable_dir};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("archive_harvest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // Fail before any crawling if outputs cannot be written
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(path = %args.output_dir.display(), error = %e, "Output directory is not writable");
        return Err(e);
    }
    if let Some(dir) = &args.download_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(path = %dir.display(), error = %e, "Download directory is not writable");
            return Err(e);
        }
    }

    let seed_urls = seeds::load_seeds(&args.seeds)?;
    let options = CrawlOptions {
        widget_pattern: Regex::new(&args.widget_pattern)?,
        max_pages: args.max_pages,
    };
    let settle = Duration::from_millis(args.settle_ms);

    let session = open_session(&args).await?;
    let mut browser = Paced::new(session, settle);

    // ---- Crawl ----
    let pages = crawl_seeds(&mut browser, &seed_urls, &options).await;
    let unreadable = pages.iter().filter(|p| p.content.is_missing()).count();
    info!(seed_pages = pages.len(), unreadable, "Crawling complete");

    // ---- Outputs ----
    let paths = OutputPaths::new(&args.output_dir, &args.prefix);
    json::write_seed_pages(&pages, &paths.json).await?;

    let tables = postprocess::build_tables(&pages);
    let headers = !args.no_headers;
    table::write_table(&tables.rows, &paths.rows, headers).await?;
    table::write_table(&tables.media, &paths.media, headers).await?;

    // ---- Downloads ----
    let report = match &args.download_dir {
        Some(dir) => {
            let client = reqwest::Client::builder()
                .user_agent(args.user_agent.as_str())
                .build()?;
            Some(download::download_all(&mut browser, &client, &tables.media, dir, settle).await)
        }
        None => {
            info!("No download directory given; skipping media downloads");
            None
        }
    };

    if let Err(e) = browser.into_inner().close().await {
        error!(error = %e, "Failed to close browser session");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        rows = tables.rows.len(),
        media_rows = tables.media.len(),
        downloaded = report.map(|r| r.downloaded),
        download_failures = report.map(|r| r.failed),
        "Execution complete"
    );

    Ok(())
}

/// Open the page-fetching session selected on the command line.
#[instrument(level = "info", skip_all, fields(backend = ?args.backend))]
async fn open_session(args: &Cli) -> Result<Session, Box<dyn Error>> {
    let session = match args.backend {
        Backend::Webdriver => {
            let options = DriverOptions {
                driver_path: args.driver_path.clone(),
                webdriver_url: args.webdriver_url.clone(),
                port: args.driver_port,
                start_timeout: Duration::from_millis(args.driver_start_timeout_ms),
                user_agent: args.user_agent.clone(),
                headless: args.headless,
            };
            Session::WebDriver(WebDriverSession::launch(&options).await?)
        }
        Backend::Http => Session::Http(HttpSession::new(&args.user_agent)?),
    };
    Ok(session)
}

/// Crawl every seed in order with the one shared session.
async fn crawl_seeds<B: Browser>(browser: &mut B, seed_urls: &[String], options: &CrawlOptions) -> Vec<SeedPage> {
    let mut pages = Vec::with_capacity(seed_urls.len());
    for (i, seed_url) in seed_urls.iter().enumerate() {
        info!(index = i + 1, total = seed_urls.len(), seed = %seed_url, "Crawling seed page");
        let content = crawl(browser, seed_url, options).await;
        pages.push(SeedPage {
            category: seed_url.clone(),
            content,
        });
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::FakeBrowser;
    use crate::scrapers::archive::page_url;
    use crate::scrapers::entry::DEFAULT_WIDGET_PATTERN;

    fn article(slug: &str, media: Option<&str>) -> String {
        let content = match media {
            Some(src) => format!(r#"<div class="entry-content"><iframe src="{src}"></iframe></div>"#),
            None => r#"<div class="entry-content"><p>text</p></div>"#.to_string(),
        };
        format!(
            r##"<article><h2 class="entry-title"><a href="https://archive.example.org/{slug}/">{slug}</a></h2>
               <span class="entry-date"><a href="#">April 1, 2016</a></span>{content}</article>"##
        )
    }

    fn listing(articles: &[String], more: bool) -> String {
        let handle = if more { r#"<div id="infinite-handle"></div>"# } else { "" };
        format!(
            r#"<html><body><div id="posts-container">{}</div>{handle}</body></html>"#,
            articles.concat()
        )
    }

    #[tokio::test]
    async fn test_pipeline_two_seeds_with_shared_entry() {
        let cat_a = "https://archive.example.org/category/a";
        let cat_b = "https://archive.example.org/category/b";
        let cat_c = "https://archive.example.org/category/c";

        let mut browser = FakeBrowser::default()
            .with_page(cat_a, &listing(&[article("one", Some("https://player.example.net/1"))], true))
            .with_page(&page_url(cat_a, 2), &listing(&[article("two", None)], false))
            .with_page(
                cat_b,
                &listing(
                    &[
                        article("three", Some("https://widgets.wp.com/likes/")),
                        article("one", Some("https://player.example.net/1")),
                    ],
                    false,
                ),
            );
        let options = CrawlOptions {
            widget_pattern: Regex::new(DEFAULT_WIDGET_PATTERN).unwrap(),
            max_pages: None,
        };

        let seeds = vec![cat_a.to_string(), cat_c.to_string(), cat_b.to_string()];
        let pages = crawl_seeds(&mut browser, &seeds, &options).await;
        assert_eq!(pages.len(), 3);
        assert!(pages[1].content.is_missing());

        let tables = postprocess::build_tables(&pages);
        let rows: Vec<(u32, u32, &str)> = tables
            .rows
            .iter()
            .map(|r| (r.sequence_id, r.group_id, r.title.as_str()))
            .collect();
        assert_eq!(rows, vec![(4, 3, "one"), (3, 3, "three"), (2, 1, "two")]);

        let media: Vec<&str> = tables.media.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(media, vec!["one"]);
    }
}
