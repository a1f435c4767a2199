//! Error types for the browser session, page crawling and media downloads.
//!
//! Field-level lookup failures are not errors at all: the extractor records
//! them as sentinel values. Only the page-unreadable and download-failure
//! categories get a type here, plus the transport errors underneath them.

use thiserror::Error;

/// Failures talking to the browser-automation layer.
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("failed to spawn driver binary {path}: {source}")]
    Spawn {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("driver at {endpoint} did not become ready within {waited_ms}ms")]
    NotReady { endpoint: String, waited_ms: u64 },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("driver error (status {status}) {error}: {message}")]
    Driver {
        status: u16,
        error: String,
        message: String,
    },

    #[error("unexpected driver response: {0}")]
    Protocol(String),

    #[error("server answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("no page has been loaded yet")]
    NoPage,
}

/// Reasons a seed page is abandoned as a whole.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("failed to load {url}: {source}")]
    Load {
        url: String,
        #[source]
        source: BrowserError,
    },

    #[error("entries container not found on {url}")]
    NoContainer { url: String },
}

/// Failures while downloading one media-bearing row.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("no playable media element on {url}")]
    NoMediaElement { url: String },

    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("media server answered {status} for {url}")]
    Status { status: u16, url: String },

    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_error_messages_name_the_url() {
        let err = PageError::NoContainer {
            url: "https://example.com/cat".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "entries container not found on https://example.com/cat"
        );

        let err = PageError::Load {
            url: "https://example.com/cat/page/2/".to_string(),
            source: BrowserError::NoPage,
        };
        assert!(err.to_string().contains("/page/2/"));
    }

    #[test]
    fn test_download_error_wraps_browser_error() {
        let err: DownloadError = BrowserError::Protocol("bad".to_string()).into();
        assert_eq!(err.to_string(), "unexpected driver response: bad");
    }
}
