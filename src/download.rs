//! Media downloads for rows in the media table.
//!
//! For every row the entry page is opened in the browser session, the first
//! `video` element's `src` is read, and that resource is streamed to
//! `video{sequence_id}.mp4` in the download directory.
//!
//! Any failure (navigation, missing `video` element, HTTP error, write
//! error) is logged with the row and the queue moves on. Nothing is retried.
//! Rows whose media field is `Missing` are attempted like any other; they
//! normally fail at the element lookup.

use crate::browser::Browser;
use crate::error::DownloadError;
use crate::models::Row;
use crate::scrapers::entry::absolute;
use futures::StreamExt;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::time::sleep;
use tracing::{error, info, instrument};
use url::Url;

static VIDEO: Lazy<Selector> = Lazy::new(|| Selector::parse("video").unwrap());

/// Tally of one download pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadReport {
    pub attempted: usize,
    pub downloaded: usize,
    pub failed: usize,
}

/// Where the media for `sequence_id` is stored.
pub fn media_file_path(dir: &Path, sequence_id: u32) -> PathBuf {
    dir.join(format!("video{sequence_id}.mp4"))
}

/// Direct source address of the first `video` element on the page.
pub fn find_media_source(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let src = document.select(&VIDEO).next()?.value().attr("src")?;
    let base = Url::parse(page_url).ok();
    Some(absolute(base.as_ref(), src))
}

/// Download media for every row, one at a time.
///
/// `pause` is slept after each row, on top of the session's own settling
/// delay after navigation.
#[instrument(level = "info", skip_all, fields(rows = rows.len(), dir = %dir.display()))]
pub async fn download_all<B: Browser>(
    browser: &mut B,
    client: &reqwest::Client,
    rows: &[Row],
    dir: &Path,
    pause: Duration,
) -> DownloadReport {
    let mut report = DownloadReport::default();

    for row in rows {
        report.attempted += 1;
        match download_one(browser, client, row, dir).await {
            Ok((path, bytes)) => {
                report.downloaded += 1;
                info!(sequence_id = row.sequence_id, path = %path.display(), bytes, "Downloaded media");
            }
            Err(e) => {
                report.failed += 1;
                error!(error = %e, row = ?row, "Failed to download media; skipping row");
            }
        }
        if !pause.is_zero() {
            sleep(pause).await;
        }
    }

    info!(
        attempted = report.attempted,
        downloaded = report.downloaded,
        failed = report.failed,
        "Download pass finished"
    );
    report
}

async fn download_one<B: Browser>(
    browser: &mut B,
    client: &reqwest::Client,
    row: &Row,
    dir: &Path,
) -> Result<(PathBuf, u64), DownloadError> {
    browser.navigate(&row.entry_url).await?;
    let html = browser.page_source().await?;
    let src = find_media_source(&html, &row.entry_url).ok_or_else(|| DownloadError::NoMediaElement {
        url: row.entry_url.clone(),
    })?;

    let path = media_file_path(dir, row.sequence_id);
    info!(sequence_id = row.sequence_id, %src, "Starting download");
    match fetch_to_file(client, &src, &path).await {
        Ok(bytes) => Ok((path, bytes)),
        Err(e) => {
            let _ = fs::remove_file(&path).await;
            Err(e)
        }
    }
}

async fn fetch_to_file(client: &reqwest::Client, url: &str, path: &Path) -> Result<u64, DownloadError> {
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DownloadError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let mut file = fs::File::create(path).await?;
    let mut stream = resp.bytes_stream();
    let mut written = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}
