//! HTTP fetch capability for pcfharvest.
//!
//! The discovery pipeline never talks to `reqwest` directly: it goes through
//! the [`PageFetcher`] trait so crawl and orchestrator tests can run against
//! mock servers. [`HttpFetcher`] is the production implementation and owns
//! retry/backoff, the politeness throttle, and identifying headers — callers
//! treat any error uniformly as "no content from this URL".

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use pcfharvest_shared::{HarvestError, HttpConfig, Result};

/// User-Agent string for harvest requests.
const USER_AGENT: &str = concat!("pcfharvest/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// FetchedPage
// ---------------------------------------------------------------------------

/// One fetched page. Owned transiently by whichever component fetched it.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested.
    pub url: Url,
    /// The final URL after redirects.
    pub final_url: Url,
    /// Raw HTML body.
    pub html: String,
    /// HTTP status code.
    pub status: u16,
}

// ---------------------------------------------------------------------------
// PageFetcher trait
// ---------------------------------------------------------------------------

/// The fetch capability consumed by the crawler, orchestrator, and downloader.
#[allow(async_fn_in_trait)]
pub trait PageFetcher {
    /// Fetch a page as text. Any non-success outcome is an error.
    async fn fetch(&self, url: &Url) -> Result<FetchedPage>;

    /// Fetch a document body as bytes (for PDF download).
    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>>;

    /// The `Content-Type` reported by a HEAD request, when one can be made.
    async fn content_type(&self, url: &Url) -> Option<String>;
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// Production fetcher: `reqwest` client plus retry/backoff and throttling.
pub struct HttpFetcher {
    client: Client,
    max_retries: u32,
    backoff_base_ms: u64,
    rate_limit_ms: u64,
}

impl HttpFetcher {
    /// Build a fetcher from HTTP configuration.
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| HarvestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff_base_ms: config.backoff_base_ms,
            rate_limit_ms: config.rate_limit_ms,
        })
    }

    /// GET with throttle and retry. Transient failures (connect errors, 429,
    /// 5xx) are retried with exponential backoff; other non-2xx statuses are
    /// terminal.
    async fn get_with_retry(&self, url: &Url) -> Result<reqwest::Response> {
        let mut attempt: u32 = 0;

        loop {
            if self.rate_limit_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.rate_limit_ms)).await;
            }

            let outcome = self.client.get(url.as_str()).send().await;

            match outcome {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }
                    if is_retryable(status) && attempt < self.max_retries {
                        self.backoff(url, attempt, &format!("HTTP {status}")).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(HarvestError::Network(format!("{url}: HTTP {status}")));
                }
                Err(e) if attempt < self.max_retries && !e.is_timeout() => {
                    self.backoff(url, attempt, &e.to_string()).await;
                    attempt += 1;
                }
                Err(e) => {
                    return Err(HarvestError::Network(format!("{url}: {e}")));
                }
            }
        }
    }

    async fn backoff(&self, url: &Url, attempt: u32, reason: &str) {
        let delay = self.backoff_base_ms.saturating_mul(1u64 << attempt.min(6));
        warn!(%url, attempt, reason, delay_ms = delay, "retrying fetch");
        tokio::time::sleep(Duration::from_millis(delay)).await;
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage> {
        debug!(%url, "fetching page");
        let response = self.get_with_retry(url).await?;

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let html = response
            .text()
            .await
            .map_err(|e| HarvestError::Network(format!("{url}: failed to read body: {e}")))?;

        Ok(FetchedPage {
            url: url.clone(),
            final_url,
            html,
            status,
        })
    }

    async fn fetch_bytes(&self, url: &Url) -> Result<Vec<u8>> {
        debug!(%url, "fetching bytes");
        let response = self.get_with_retry(url).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| HarvestError::Network(format!("{url}: failed to read body: {e}")))?;

        Ok(bytes.to_vec())
    }

    async fn content_type(&self, url: &Url) -> Option<String> {
        let response = self.client.head(url.as_str()).send().await.ok()?;
        response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string())
    }
}

/// Statuses worth retrying: rate limiting and transient server errors.
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
