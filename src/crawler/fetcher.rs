//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients with browser-like headers
//! - Randomized pre-request delays to mimic human pacing
//! - Retry logic with escalating backoff for blocked and failed requests
//! - Error classification

use crate::config::HttpConfig;
use async_trait::async_trait;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Browser user agent strings rotated between runs
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36",
];

/// Errors a fetch can terminate with
///
/// Blocked responses (403/429) and network failures are retried internally
/// and only surface here once every attempt is spent.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-retryable HTTP status (anything outside 2xx, 403 and 429)
    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    /// All retry attempts were used without a successful response
    #[error("Failed to fetch {url} after {attempts} attempts: {last_cause}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_cause: String,
    },
}

/// Source of page bodies for the crawl loop
///
/// Abstracted as a trait so the coordinator and worker pool can be tested
/// against scripted responses without a network.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches the body of the given URL as text
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTP-backed fetcher with retry and pacing behavior
pub struct HttpFetcher {
    client: Client,
    config: HttpConfig,
}

impl HttpFetcher {
    /// Creates a fetcher with a client built from the given configuration
    pub fn new(config: HttpConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(&config)?;
        Ok(Self { client, config })
    }

    /// Backoff after a blocked (403/429) response: `2.0 * attempt + U(0, 1.5)`
    async fn blocked_backoff(&self, attempt: u32) {
        scaled_backoff(2.0, attempt, 1.5, self.config.backoff_scale).await;
    }

    /// Backoff after a network failure: `1.5 * attempt + U(0, 1.0)`
    async fn network_backoff(&self, attempt: u32) {
        scaled_backoff(1.5, attempt, 1.0, self.config.backoff_scale).await;
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a URL with full retry handling
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 403 / 429 | Backoff `2.0 * attempt + U(0, 1.5)`, retry |
    /// | Timeout / connection / body read error | Backoff `1.5 * attempt + U(0, 1.0)`, retry |
    /// | Other non-2xx | Immediate `HttpStatus` error |
    /// | Attempts spent | `Exhausted` with the last failure cause |
    ///
    /// Every attempt is preceded by a random delay drawn from
    /// `request_delay_range`.
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut last_cause = String::new();

        for attempt in 1..=self.config.max_retries {
            human_delay(self.config.request_delay_range).await;

            let response = match self.client.get(url).send().await {
                Ok(response) => response,
                Err(e) => {
                    last_cause = e.to_string();
                    warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        url,
                        error = %e,
                        "Request failed"
                    );
                    self.network_backoff(attempt).await;
                    continue;
                }
            };

            let status = response.status();

            if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
                // Body length hints whether this is a block page or a captcha
                let body_len = response.text().await.map(|b| b.len()).unwrap_or(0);
                last_cause = format!("HTTP {}", status.as_u16());
                warn!(
                    status = status.as_u16(),
                    attempt, body_len, url, "Blocked response"
                );
                self.blocked_backoff(attempt).await;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::HttpStatus {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            match response.text().await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    last_cause = e.to_string();
                    warn!(
                        attempt,
                        max_retries = self.config.max_retries,
                        url,
                        error = %e,
                        "Body read failed"
                    );
                    self.network_backoff(attempt).await;
                }
            }
        }

        Err(FetchError::Exhausted {
            url: url.to_string(),
            attempts: self.config.max_retries,
            last_cause,
        })
    }
}

/// Builds an HTTP client with browser-like headers
///
/// A user agent is picked at random when the client is built and kept for
/// the lifetime of the client, so all requests within one run look like a
/// single browser session.
///
/// # Arguments
///
/// * `config` - HTTP timeouts to apply
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let user_agent = USER_AGENTS[rand::thread_rng().gen_range(0..USER_AGENTS.len())];

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("uk-UA,uk;q=0.9,en-US;q=0.8,en;q=0.7"),
    );

    Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sleeps for a random duration drawn uniformly from `range` seconds
///
/// A degenerate range such as `(0.0, 0.0)` sleeps for the fixed value,
/// which lets tests disable pacing entirely.
pub async fn human_delay(range: (f64, f64)) {
    let (min, max) = range;
    let secs = if max > min {
        rand::thread_rng().gen_range(min..max)
    } else {
        min
    };

    if secs > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }
}

/// Sleeps for `(base * attempt + U(0, jitter_max)) * scale` seconds
async fn scaled_backoff(base: f64, attempt: u32, jitter_max: f64, scale: f64) {
    let jitter = rand::thread_rng().gen_range(0.0..jitter_max);
    let secs = (base * attempt as f64 + jitter) * scale;

    if secs > 0.0 {
        tokio::time::sleep(Duration::from_secs_f64(secs)).await;
    }
}
