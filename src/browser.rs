//! Browser-automation session used to read rendered archive pages.
//!
//! The crawler and the downloader only need two things from a browser:
//! go to a URL, and hand back the current DOM as HTML. That is the
//! [`Browser`] trait. Implementations:
//!
//! - [`WebDriverSession`]: a W3C WebDriver session (e.g. chromedriver),
//!   optionally spawning the driver binary itself
//! - [`HttpSession`]: plain HTTP GETs, for archives rendered server-side
//! - [`Paced`]: decorator that waits a fixed settling delay after every
//!   navigation so asynchronously rendered content has time to appear
//!
//! # Pacing
//!
//! The settling delay is a blind sleep. Polling the DOM for a readiness
//! condition would be more robust; the fixed delay is kept configurable
//! instead.

use crate::error::BrowserError;
use crate::utils::truncate_for_log;
use serde_json::{Value, json};
use std::fmt;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Desktop Chrome user agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; U; Intel Mac OS X 10_5_8; en-US) AppleWebKit/532.2 (KHTML, like Gecko) Chrome/4.0.222.5 Safari/532.2";

const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Minimal browser surface needed to crawl and download.
pub trait Browser {
    /// Load `url` in the session, replacing the current page.
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Serialized DOM of the current page.
    async fn page_source(&mut self) -> Result<String, BrowserError>;
}

/// Wraps any [`Browser`] and sleeps for `settle` after every navigation.
pub struct Paced<B> {
    inner: B,
    settle: Duration,
}

impl<B: Browser> Paced<B> {
    pub fn new(inner: B, settle: Duration) -> Self {
        Self { inner, settle }
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B> fmt::Debug for Paced<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paced").field("settle", &self.settle).finish()
    }
}

impl<B: Browser> Browser for Paced<B> {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.inner.navigate(url).await?;
        if !self.settle.is_zero() {
            sleep(self.settle).await;
        }
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        self.inner.page_source().await
    }
}

/// How to reach (or start) the WebDriver server.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    /// Driver binary to spawn; when `None`, connect to `webdriver_url`.
    pub driver_path: Option<String>,
    pub webdriver_url: String,
    /// Port handed to a spawned driver.
    pub port: u16,
    pub start_timeout: Duration,
    pub user_agent: String,
    pub headless: bool,
}

/// A W3C WebDriver session spoken over HTTP.
pub struct WebDriverSession {
    client: reqwest::Client,
    endpoint: String,
    session_id: String,
    // Held so a spawned driver lives exactly as long as the session.
    driver: Option<Child>,
}

impl fmt::Debug for WebDriverSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebDriverSession")
            .field("endpoint", &self.endpoint)
            .field("session_id", &self.session_id)
            .field("spawned", &self.driver.is_some())
            .finish()
    }
}

impl WebDriverSession {
    /// Start (if configured) the driver, wait until it is ready and open a session.
    #[instrument(level = "info", skip_all, fields(driver = ?options.driver_path))]
    pub async fn launch(options: &DriverOptions) -> Result<Self, BrowserError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        let (endpoint, driver) = match &options.driver_path {
            Some(path) => {
                let child = Command::new(path)
                    .arg(format!("--port={}", options.port))
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .kill_on_drop(true)
                    .spawn()
                    .map_err(|source| BrowserError::Spawn {
                        path: path.clone(),
                        source,
                    })?;
                info!(%path, port = options.port, "Spawned driver binary");
                (format!("http://127.0.0.1:{}", options.port), Some(child))
            }
            None => (options.webdriver_url.trim_end_matches('/').to_string(), None),
        };

        let mut session = Self {
            client,
            endpoint,
            session_id: String::new(),
            driver,
        };
        session.wait_until_ready(options.start_timeout).await?;

        let response = session
            .command(reqwest::Method::POST, "/session", Some(capabilities(options)))
            .await?;
        session.session_id = session_id_from(&response)?;
        info!(endpoint = %session.endpoint, session_id = %session.session_id, "WebDriver session opened");
        Ok(session)
    }

    /// Poll `GET /status` until the driver reports ready.
    async fn wait_until_ready(&mut self, timeout: Duration) -> Result<(), BrowserError> {
        let t0 = Instant::now();
        loop {
            if let Ok(resp) = self.client.get(format!("{}/status", self.endpoint)).send().await {
                if let Ok(body) = resp.json::<Value>().await {
                    if body["value"]["ready"].as_bool().unwrap_or(false) {
                        debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Driver ready");
                        return Ok(());
                    }
                }
            }

            if let Some(child) = self.driver.as_mut() {
                if let Ok(Some(status)) = child.try_wait() {
                    warn!(%status, "Driver exited before becoming ready");
                    return Err(BrowserError::NotReady {
                        endpoint: self.endpoint.clone(),
                        waited_ms: t0.elapsed().as_millis() as u64,
                    });
                }
            }

            if t0.elapsed() >= timeout {
                return Err(BrowserError::NotReady {
                    endpoint: self.endpoint.clone(),
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Send one WebDriver command and return the `value` member of the reply.
    async fn command(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = format!("{}{}", self.endpoint, path);
        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let resp = request.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let body: Value = serde_json::from_str(&text).map_err(|e| {
            BrowserError::Protocol(format!("{e}: {}", truncate_for_log(&text, 200)))
        })?;

        if !status.is_success() {
            return Err(driver_error(status.as_u16(), &body));
        }
        Ok(body.get("value").cloned().unwrap_or(Value::Null))
    }

    /// Close the browser session; a spawned driver is killed afterwards.
    #[instrument(level = "info", skip_all, fields(session_id = %self.session_id))]
    pub async fn quit(mut self) -> Result<(), BrowserError> {
        let path = format!("/session/{}", self.session_id);
        let result = self.command(reqwest::Method::DELETE, &path, None).await;
        if let Some(mut child) = self.driver.take() {
            let _ = child.kill().await;
        }
        result.map(|_| ())
    }
}

impl Browser for WebDriverSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let path = format!("/session/{}/url", self.session_id);
        self.command(reqwest::Method::POST, &path, Some(json!({ "url": url })))
            .await?;
        debug!(%url, "Navigated");
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        let path = format!("/session/{}/source", self.session_id);
        match self.command(reqwest::Method::GET, &path, None).await? {
            Value::String(html) => Ok(html),
            other => Err(BrowserError::Protocol(format!(
                "page source was not a string: {}",
                truncate_for_log(&other.to_string(), 120)
            ))),
        }
    }
}

/// New-session payload: Chrome with the configured user agent.
fn capabilities(options: &DriverOptions) -> Value {
    let mut args = vec![format!("--user-agent={}", options.user_agent)];
    if options.headless {
        args.push("--headless=new".to_string());
    }
    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "goog:chromeOptions": { "args": args }
            }
        }
    })
}

fn session_id_from(value: &Value) -> Result<String, BrowserError> {
    value["sessionId"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| BrowserError::Protocol("new session reply has no sessionId".to_string()))
}

fn driver_error(status: u16, body: &Value) -> BrowserError {
    let value = &body["value"];
    BrowserError::Driver {
        status,
        error: value["error"].as_str().unwrap_or("unknown error").to_string(),
        message: value["message"].as_str().unwrap_or_default().to_string(),
    }
}

/// Fetches pages with plain HTTP; no script execution.
#[derive(Debug)]
pub struct HttpSession {
    client: reqwest::Client,
    current: Option<String>,
}

impl HttpSession {
    pub fn new(user_agent: &str) -> Result<Self, BrowserError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            current: None,
        })
    }
}

impl Browser for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.current = None;
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BrowserError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        self.current = Some(resp.text().await?);
        Ok(())
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        self.current.clone().ok_or(BrowserError::NoPage)
    }
}

/// The session picked on the command line.
#[derive(Debug)]
pub enum Session {
    WebDriver(WebDriverSession),
    Http(HttpSession),
}

impl Session {
    pub async fn close(self) -> Result<(), BrowserError> {
        match self {
            Session::WebDriver(session) => session.quit().await,
            Session::Http(_) => Ok(()),
        }
    }
}

impl Browser for Session {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        match self {
            Session::WebDriver(session) => session.navigate(url).await,
            Session::Http(session) => session.navigate(url).await,
        }
    }

    async fn page_source(&mut self) -> Result<String, BrowserError> {
        match self {
            Session::WebDriver(session) => session.page_source().await,
            Session::Http(session) => session.page_source().await,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeBrowser;
    use super::*;

    fn options(headless: bool) -> DriverOptions {
        DriverOptions {
            driver_path: None,
            webdriver_url: "http://127.0.0.1:9515".to_string(),
            port: 9515,
            start_timeout: Duration::from_secs(1),
            user_agent: "test-agent/1.0".to_string(),
            headless,
        }
    }

    #[test]
    fn test_capabilities_carry_user_agent() {
        let caps = capabilities(&options(false));
        let args = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"];
        assert_eq!(args[0], "--user-agent=test-agent/1.0");
        assert_eq!(args.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_capabilities_headless_flag() {
        let caps = capabilities(&options(true));
        let args = &caps["capabilities"]["alwaysMatch"]["goog:chromeOptions"]["args"];
        assert_eq!(args[1], "--headless=new");
    }

    #[test]
    fn test_session_id_from_reply() {
        let reply = json!({ "sessionId": "abc123", "capabilities": {} });
        assert_eq!(session_id_from(&reply).unwrap(), "abc123");
        assert!(matches!(
            session_id_from(&json!({})),
            Err(BrowserError::Protocol(_))
        ));
    }

    #[test]
    fn test_driver_error_reads_w3c_body() {
        let body = json!({
            "value": { "error": "invalid session id", "message": "session deleted", "stacktrace": "" }
        });
        match driver_error(404, &body) {
            BrowserError::Driver {
                status,
                error,
                message,
            } => {
                assert_eq!(status, 404);
                assert_eq!(error, "invalid session id");
                assert_eq!(message, "session deleted");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_paced_passes_through() {
        let fake = FakeBrowser::default().with_page("https://example.com/", "<p>hi</p>");
        let mut paced = Paced::new(fake, Duration::ZERO);
        paced.navigate("https://example.com/").await.unwrap();
        assert_eq!(paced.page_source().await.unwrap(), "<p>hi</p>");
        assert!(paced.navigate("https://example.com/nope").await.is_err());
        assert_eq!(paced.into_inner().visited.len(), 2);
    }

    #[tokio::test]
    async fn test_paced_waits_after_navigation() {
        let fake = FakeBrowser::default().with_page("https://example.com/", "");
        let mut paced = Paced::new(fake, Duration::from_millis(20));
        let t0 = Instant::now();
        paced.navigate("https://example.com/").await.unwrap();
        assert!(t0.elapsed() >= Duration::from_millis(20));
    }
}
