//! Page fetching with politeness delay and exponential backoff retries.
//!
//! # Architecture
//!
//! - [`Fetch`]: core trait turning a URL into a [`Page`]
//! - [`HttpFetcher`]: `reqwest` implementation
//! - [`Throttled`]: decorator spacing consecutive requests by the download delay
//! - [`RetryFetch`]: decorator retrying transient failures
//!
//! The crawler uses `RetryFetch<Throttled<HttpFetcher>>`, so every attempt,
//! including retries, waits its turn behind the delay.
//!
//! # Retry Strategy
//!
//! - Transport errors, 5xx, 408 and 429 are retried; other statuses are not
//! - Exponential backoff from `base_delay`, capped at 30 seconds
//! - Random jitter (0-250ms) added to each backoff

use crate::models::Page;
use rand::{Rng, rng};
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, error, instrument, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {status} from {url}")]
    Status { url: Url, status: StatusCode },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Status { status, .. } => {
                status.is_server_error()
                    || *status == StatusCode::REQUEST_TIMEOUT
                    || *status == StatusCode::TOO_MANY_REQUESTS
            }
        }
    }
}

/// Trait for fetching a page by URL.
///
/// Implementations may be layered: [`RetryFetch`] and [`Throttled`] wrap any
/// other `Fetch` and add behavior around its calls.
pub trait Fetch {
    /// Fetch `url` and return its body.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute address of the page
    ///
    /// # Returns
    ///
    /// The page, addressed by the URL the body was actually served from
    /// (after redirects), or a [`FetchError`] for transport failures and
    /// non-success statuses.
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError>;
}

/// Plain HTTP fetcher.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher with its own connection pool.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Sent as the `User-Agent` header on every request
    /// * `timeout` - Total time allowed for one request, body included
    ///
    /// # Returns
    ///
    /// The fetcher, or the client builder's error if TLS setup fails.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.clone(),
            source,
        };
        let t0 = Instant::now();
        let response = self.client.get(url.clone()).send().await.map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status,
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(transport)?;
        debug!(
            status = status.as_u16(),
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            final_url = %final_url,
            "Fetched page"
        );
        Ok(Page::new(final_url, body))
    }
}

/// Spaces consecutive requests at least one download delay apart.
///
/// With `randomize` set, each wait is drawn uniformly from 0.5x to 1.5x the
/// configured delay.
pub struct Throttled<T> {
    inner: T,
    delay: Duration,
    randomize: bool,
    last_request: Mutex<Option<Instant>>,
}

impl<T> Throttled<T> {
    /// Wrap `inner` so that no two requests start less than `delay` apart.
    /// The first request goes out immediately.
    pub fn new(inner: T, delay: Duration, randomize: bool) -> Self {
        Self {
            inner,
            delay,
            randomize,
            last_request: Mutex::new(None),
        }
    }

    fn next_delay(&self) -> Duration {
        if self.randomize && !self.delay.is_zero() {
            self.delay.mul_f64(rng().random_range(0.5..1.5))
        } else {
            self.delay
        }
    }
}

impl<T> fmt::Debug for Throttled<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Throttled")
            .field("delay", &self.delay)
            .field("randomize", &self.randomize)
            .finish()
    }
}

impl<T: Fetch> Fetch for Throttled<T> {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        {
            // Held across the sleep so concurrent callers queue up behind it.
            let mut last = self.last_request.lock().await;
            if let Some(prev) = *last {
                let wait = self.next_delay();
                let elapsed = prev.elapsed();
                if elapsed < wait {
                    sleep(wait - elapsed).await;
                }
            }
            *last = Some(Instant::now());
        }
        self.inner.fetch(url).await
    }
}

/// Retries retryable failures of the wrapped fetcher with exponential backoff.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryFetch<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryFetch<T> {
    /// Wrap `inner` with up to `max_retries` extra attempts per URL.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fetcher to retry
    /// * `max_retries` - Attempts after the first; zero disables retrying
    /// * `base_delay` - Wait before the first retry, doubled for each later
    ///   one and capped at 30 seconds
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> Duration {
        let shift = (attempt.saturating_sub(1)).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
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

impl<T: Fetch> Fetch for RetryFetch<T> {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.fetch(url).await {
                Ok(page) => return Ok(page),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if !e.is_retryable() {
                        return Err(e);
                    }
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_total = total_dt.as_millis() as u64,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = self.backoff(attempt) + Duration::from_millis(jitter_ms);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis() as u64,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}
