//! Fetching raw search result pages, with bounded retry at the transport edge.
//!
//! The module uses a trait-based design so the pagination loop never knows
//! whether it talks to the network:
//! - [`PageSource`]: one page request in, raw HTML out
//! - [`HttpPageSource`]: the `reqwest` implementation against the search endpoint
//! - [`RetryFetch`]: decorator adding exponential backoff with jitter for
//!   transient failures (transport errors, `429`, `5xx`)
//!
//! # Retry Strategy
//!
//! ```text
//! delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..=max_jitter)
//! ```
//!
//! A definitive status such as `404` is returned on the first attempt.

use crate::error::{Result, ScrapeError};
use rand::{Rng, rng};
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};
use url::Url;

/// How the page cursor is sent to the search endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PageProtocol {
    /// `pindex=<n>&psize=<size>`; a short page is the last one.
    #[default]
    #[value(name = "offset_limit")]
    OffsetLimit,
    /// `page=<n>`; stops when the page shows no "next" link.
    #[value(name = "page_number")]
    PageNumber,
}

/// One page of one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub query: String,
    /// 1-based.
    pub page: u32,
    pub page_size: usize,
    pub protocol: PageProtocol,
}

impl PageRequest {
    /// Full request URL under `search_url`, with the query percent-encoded.
    pub fn url(&self, search_url: &Url, query_param: &str) -> String {
        let query = urlencoding::encode(&self.query);
        let cursor = match self.protocol {
            PageProtocol::OffsetLimit => format!("pindex={}&psize={}", self.page, self.page_size),
            PageProtocol::PageNumber => format!("page={}", self.page),
        };
        let separator = if search_url.query().is_some() { '&' } else { '?' };
        format!("{search_url}{separator}{query_param}={query}&{cursor}")
    }
}

/// Anything that can hand back the raw HTML of a result page.
pub trait PageSource {
    async fn fetch(&self, request: &PageRequest) -> Result<String>;
}

/// Fetches pages from the live search endpoint.
#[derive(Debug, Clone)]
pub struct HttpPageSource {
    client: reqwest::Client,
    search_url: Url,
    query_param: String,
}

impl HttpPageSource {
    pub fn new(
        search_url: Url,
        query_param: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ScrapeError::Config(format!("cannot build http client: {e}")))?;
        Ok(Self {
            client,
            search_url,
            query_param: query_param.to_string(),
        })
    }
}

impl PageSource for HttpPageSource {
    #[instrument(level = "info", skip_all, fields(page = request.page))]
    async fn fetch(&self, request: &PageRequest) -> Result<String> {
        let url = request.url(&self.search_url, &self.query_param);
        let t0 = Instant::now();
        let transport = |source: reqwest::Error| ScrapeError::Transport {
            page: request.page,
            url: url.clone(),
            source,
        };

        let response = self.client.get(&url).send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), "Upstream returned non-success status");
            return Err(ScrapeError::UpstreamStatus {
                page: request.page,
                status: status.as_u16(),
                url: url.clone(),
            });
        }
        let body = response.text().await.map_err(transport)?;
        debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched result page"
        );
        Ok(body)
    }
}

/// Wrapper that retries transient failures of any [`PageSource`].
pub struct RetryFetch<T> {
    inner: T,
    /// Retries after the first attempt.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: Duration,
    max_delay: Duration,
    max_jitter: Duration,
}

impl<T: PageSource> RetryFetch<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(10),
            max_jitter: Duration::from_millis(250),
        }
    }

    /// Replace the default 250ms jitter ceiling. Zero disables jitter.
    pub fn with_max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rng().random_range(0..=jitter_ms)
        };
        delay + Duration::from_millis(jitter)
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: PageSource> PageSource for RetryFetch<T> {
    #[instrument(level = "debug", skip_all, fields(page = request.page))]
    async fn fetch(&self, request: &PageRequest) -> Result<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(request).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        ?delay,
                        error = %e,
                        "Page fetch failed; backing off"
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        attempt,
                        elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                        error = %e,
                        "Page fetch failed for good"
                    );
                    return Err(e);
                }
            }
        }
    }
}
