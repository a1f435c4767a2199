//! Metadata extraction for a single archive post.
//!
//! Each field is looked up independently and falls back to a sentinel when
//! its element is absent, so extraction never fails and one broken field
//! never hides the others.
//!
//! | Field | Lookup | Fallback |
//! |-------|--------|----------|
//! | title | text of `.entry-title` | `Missing` |
//! | entry URL | `href` of the `a` inside `.entry-title` | `Missing` |
//! | date | text of the `a` inside `.entry-date` | `Missing` |
//! | media URL | `src` of the `iframe` inside `.entry-content` | `Missing` without a content block, `NA` without a frame or for widget frames |

use crate::models::{Entry, MISSING, NOT_AVAILABLE};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::debug;
use url::Url;

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse(".entry-title").unwrap());
static DATE: Lazy<Selector> = Lazy::new(|| Selector::parse(".entry-date").unwrap());
static CONTENT: Lazy<Selector> = Lazy::new(|| Selector::parse(".entry-content").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IFRAME: Lazy<Selector> = Lazy::new(|| Selector::parse("iframe").unwrap());

/// Default pattern for embedded widget frames that carry no media.
pub const DEFAULT_WIDGET_PATTERN: &str = r"widgets\.wp\.com";

/// Extract all four fields from one rendered post.
///
/// `base` is the URL of the page the post was found on; relative `href`
/// and `src` values are resolved against it. Without a base the raw
/// attribute values are kept.
pub fn extract_entry(article: ElementRef<'_>, base: Option<&Url>, widget: &Regex) -> Entry {
    Entry {
        title: extract_title(article).unwrap_or_else(missing),
        entry_url: extract_entry_url(article, base).unwrap_or_else(missing),
        date: extract_date(article).unwrap_or_else(missing),
        media_url: extract_media_url(article, base, widget),
    }
}

fn missing() -> String {
    MISSING.to_string()
}

fn first<'a>(scope: ElementRef<'a>, selector: &Selector) -> Option<ElementRef<'a>> {
    scope.select(selector).next()
}

/// Text content with runs of whitespace collapsed, the way a browser renders it.
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve an attribute value to an absolute URL.
///
/// The value passes through unchanged when there is no base or it cannot
/// be joined.
pub(crate) fn absolute(base: Option<&Url>, reference: &str) -> String {
    base.and_then(|base| base.join(reference.trim()).ok())
        .map(|u| u.to_string())
        .unwrap_or_else(|| reference.to_string())
}

fn extract_title(article: ElementRef<'_>) -> Option<String> {
    first(article, &TITLE).map(visible_text)
}

fn extract_entry_url(article: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let title = first(article, &TITLE)?;
    let href = first(title, &ANCHOR)?.value().attr("href")?;
    Some(absolute(base, href))
}

fn extract_date(article: ElementRef<'_>) -> Option<String> {
    let date = first(article, &DATE)?;
    first(date, &ANCHOR).map(visible_text)
}

fn extract_media_url(article: ElementRef<'_>, base: Option<&Url>, widget: &Regex) -> String {
    let Some(content) = first(article, &CONTENT) else {
        debug!("entry-content block is missing");
        return MISSING.to_string();
    };

    let Some(src) = first(content, &IFRAME).and_then(|frame| frame.value().attr("src")) else {
        return NOT_AVAILABLE.to_string();
    };

    let src = absolute(base, src);
    if widget.is_match(&src) {
        NOT_AVAILABLE.to_string()
    } else {
        src
    }
}
