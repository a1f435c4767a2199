//! Command-line interface definitions for Archive Harvest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Driver-related options can also be supplied through environment variables.

use crate::browser::DEFAULT_USER_AGENT;
use crate::scrapers::entry::DEFAULT_WIDGET_PATTERN;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// How pages are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Drive a real browser through a WebDriver server.
    Webdriver,
    /// Plain HTTP requests; no scripts run.
    Http,
}

/// Command-line arguments for the Archive Harvest application.
///
/// # Examples
///
/// ```sh
/// # Crawl with a locally installed chromedriver and download media
/// archive_harvest -s start_urls.csv -o ./out -d ./videos --driver-path /usr/local/bin/chromedriver
///
/// # Metadata only, against an already running driver
/// WEBDRIVER_URL=http://127.0.0.1:4444 archive_harvest -s start_urls.csv -o ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// CSV file of seed URLs (first column, no header)
    #[arg(short, long, default_value = "start_urls.csv")]
    pub seeds: PathBuf,

    /// Directory for the JSON and CSV outputs
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// File name stem of the outputs
    #[arg(long, default_value = "archive")]
    pub prefix: String,

    /// Directory for downloaded media; downloads are skipped when absent
    #[arg(short, long)]
    pub download_dir: Option<PathBuf>,

    /// Page fetching backend
    #[arg(long, value_enum, default_value_t = Backend::Webdriver)]
    pub backend: Backend,

    /// Browser-driver binary to spawn (e.g. chromedriver)
    #[arg(long, env = "WEBDRIVER_PATH")]
    pub driver_path: Option<String>,

    /// WebDriver server to connect to when no driver binary is given
    #[arg(long, env = "WEBDRIVER_URL", default_value = "http://127.0.0.1:9515")]
    pub webdriver_url: String,

    /// Port for a spawned driver
    #[arg(long, default_value_t = 9515)]
    pub driver_port: u16,

    /// How long to wait for a spawned driver to become ready
    #[arg(long, default_value_t = 10_000)]
    pub driver_start_timeout_ms: u64,

    /// Run the browser headless
    #[arg(long)]
    pub headless: bool,

    /// User agent presented by the browser and the downloader
    #[arg(long, env = "HARVEST_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Fixed wait after each navigation, in milliseconds
    #[arg(long, default_value_t = 1_000)]
    pub settle_ms: u64,

    /// Regex for embedded frames that carry no media
    #[arg(long, default_value = DEFAULT_WIDGET_PATTERN)]
    pub widget_pattern: String,

    /// Maximum listing pages per seed, at least 1 (unbounded by default)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: Option<u32>,

    /// Write CSV tables without a header row
    #[arg(long)]
    pub no_headers: bool,
}
