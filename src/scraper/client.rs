//! Blocking HTTP client with a browser header set, politeness delay, and bounded retries.

use crate::scraper::error::FetchError;
use crate::scraper::PageSource;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Url;
use std::time::{Duration, Instant};

/// The catalog rejects requests that do not look like a browser.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US";
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DELAY_SECS: u64 = 1;
const MAX_REDIRECTS: usize = 10;

/// Default number of attempts per request (initial plus one retry).
pub const DEFAULT_RETRY_COUNT: u32 = 2;
/// Default backoff in seconds before each retry.
const DEFAULT_BACKOFF_SECS: [u64; 1] = [2];

/// Blocking HTTP client that enforces a delay between requests.
#[derive(Debug)]
pub struct PoliteClient {
    inner: reqwest::blocking::Client,
    delay: Duration,
    last_request: Option<Instant>,
    retry_count: u32,
    backoff_secs: Vec<u64>,
}

impl PoliteClient {
    /// Build a polite client with default headers, timeout, and delay.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::builder().build()
    }

    pub fn builder() -> PoliteClientBuilder {
        PoliteClientBuilder::default()
    }

    /// GET `url` and return the body text.
    ///
    /// Transient failures (timeout, connect, 5xx) are retried up to the configured attempt
    /// count; 4xx and other errors are returned immediately.
    pub fn get_text(&mut self, url: &Url) -> Result<String, FetchError> {
        let max_attempts = self.retry_count.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.get_once(url) {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let backoff = self.backoff_for(attempt);
                    tracing::debug!(%url, attempt, backoff_secs = backoff, error = %e, "transient failure; retrying");
                    std::thread::sleep(Duration::from_secs(backoff));
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn get_once(&mut self, url: &Url) -> Result<String, FetchError> {
        self.wait_delay();
        tracing::debug!(%url, "GET");
        let result = self.inner.get(url.clone()).send();
        self.last_request = Some(Instant::now());
        let response = result.map_err(|e| FetchError::Transport {
            url: url.to_string(),
            source: e,
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        response.text().map_err(|e| FetchError::BodyRead {
            url: url.to_string(),
            source: e,
        })
    }

    /// Backoff after the given 1-based failed attempt; reuses the last value when the list is short.
    fn backoff_for(&self, attempt: u32) -> u64 {
        let idx = attempt.saturating_sub(1) as usize;
        self.backoff_secs
            .get(idx)
            .or_else(|| self.backoff_secs.last())
            .copied()
            .unwrap_or(1)
    }

    fn wait_delay(&self) {
        if let Some(last) = self.last_request {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                std::thread::sleep(self.delay - elapsed);
            }
        }
    }
}

impl PageSource for PoliteClient {
    fn fetch(&mut self, url: &Url) -> Result<String, FetchError> {
        self.get_text(url)
    }
}

/// Builder for PoliteClient with optional headers, delay, timeout, and retry settings.
#[derive(Debug)]
pub struct PoliteClientBuilder {
    user_agent: Option<String>,
    accept_language: Option<String>,
    delay_secs: u64,
    timeout_secs: u64,
    retry_count: u32,
    retry_backoff_secs: Vec<u64>,
}

impl Default for PoliteClientBuilder {
    fn default() -> Self {
        Self {
            user_agent: None,
            accept_language: None,
            delay_secs: DEFAULT_DELAY_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_backoff_secs: DEFAULT_BACKOFF_SECS.to_vec(),
        }
    }
}

impl PoliteClientBuilder {
    /// Set a custom User-Agent. If not set, a desktop browser string is used.
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    pub fn accept_language(mut self, lang: impl Into<String>) -> Self {
        self.accept_language = Some(lang.into());
        self
    }

    /// Set delay between requests in seconds. Default 1.
    pub fn delay_secs(mut self, secs: u64) -> Self {
        self.delay_secs = secs;
        self
    }

    /// Set request timeout in seconds. Default 30.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set number of attempts per request (default 2, minimum 1).
    pub fn retry_count(mut self, n: u32) -> Self {
        self.retry_count = n.max(1);
        self
    }

    /// Set backoff delays in seconds before each retry. If shorter than retry_count - 1, the last value is reused.
    pub fn retry_backoff_secs(mut self, secs: Vec<u64>) -> Self {
        self.retry_backoff_secs = secs;
        self
    }

    pub fn build(self) -> Result<PoliteClient, reqwest::Error> {
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let language = self
            .accept_language
            .unwrap_or_else(|| DEFAULT_ACCEPT_LANGUAGE.to_string());
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        // Unrepresentable value: keep the default.
        let language = HeaderValue::from_str(&language)
            .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE));
        headers.insert(ACCEPT_LANGUAGE, language);

        let inner = reqwest::blocking::Client::builder()
            .cookie_store(true)
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(self.timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(PoliteClient {
            inner,
            delay: Duration::from_secs(self.delay_secs),
            last_request: None,
            retry_count: self.retry_count,
            backoff_secs: self.retry_backoff_secs,
        })
    }
}
