//! Page Fetcher with Retry
//!
//! One pooled HTTP client per process, shared by every strategy that needs raw
//! HTML. Transient failures are retried with exponential backoff.
//!
//! **Backoff Strategy:**
//! - Initial delay: 500ms (configurable)
//! - Multiplier: 2.0 (0.5s, 1s, 2s)
//! - Retried: status codes in the policy (default 429/500/502/503/504) and
//!   transport errors (connect, timeout)
//! - Any other non-success status fails immediately
//!
//! Every extraction stage asks for the same page. The outcome of a fetch
//! (body or final error) is kept for `http.page_cache_secs`, so one webhook
//! downloads its page once no matter how many stages run.

use crate::types::StrategyError;
use recipe_common::config::HttpConfig;
use reqwest::{header, Client, Url};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Page fetch error
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure
    #[error("Request failed: {0}")]
    Transport(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// Body could not be read
    #[error("Failed to read body: {0}")]
    Body(String),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        FetchError::Transport(err.to_string())
    }
}

impl From<FetchError> for StrategyError {
    fn from(err: FetchError) -> Self {
        StrategyError::Network(err.to_string())
    }
}

/// Retry policy for page fetches
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &HttpConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            retry_statuses: config.retry_statuses.clone(),
        }
    }

    /// Backoff before retry number `retry` (1-based)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }

    /// Whether an error is worth another attempt
    pub fn is_retryable(&self, err: &FetchError) -> bool {
        match err {
            FetchError::Transport(_) => true,
            FetchError::Status { status, .. } => self.retry_statuses.contains(status),
            FetchError::Body(_) => false,
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or retries run out
pub async fn retry_with_backoff<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut retry = 0u32;

    loop {
        match operation().await {
            Ok(value) => {
                if retry > 0 {
                    debug!(operation = operation_name, retries = retry, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => {
                if !policy.is_retryable(&err) || retry >= policy.max_retries {
                    if retry > 0 {
                        warn!(
                            operation = operation_name,
                            retries = retry,
                            error = %err,
                            "Giving up after retries"
                        );
                    }
                    return Err(err);
                }

                retry += 1;
                let backoff = policy.backoff_for(retry);
                warn!(
                    operation = operation_name,
                    retry,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Transient failure, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

struct CachedPage {
    fetched_at: Instant,
    result: Result<Arc<str>, FetchError>,
}

/// Short-lived memo of fetch outcomes keyed by URL
pub struct PageCache {
    ttl: Duration,
    pages: Mutex<HashMap<String, CachedPage>>,
}

impl PageCache {
    /// A zero `ttl` disables reuse
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            pages: Mutex::new(HashMap::new()),
        }
    }

    /// Cached outcome for `url`, or the outcome of running `fetch`
    pub async fn get_or_fetch<F, Fut>(&self, url: &Url, fetch: F) -> Result<Arc<str>, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, FetchError>>,
    {
        if self.ttl.is_zero() {
            return fetch().await.map(Arc::from);
        }

        if let Some(page) = self.pages.lock().await.get(url.as_str()) {
            if page.fetched_at.elapsed() < self.ttl {
                debug!(url = %url, ok = page.result.is_ok(), "Reusing earlier fetch");
                return page.result.clone();
            }
        }

        // Lock is not held across the download
        let result: Result<Arc<str>, FetchError> = fetch().await.map(Arc::from);

        let mut pages = self.pages.lock().await;
        let ttl = self.ttl;
        pages.retain(|_, page| page.fetched_at.elapsed() < ttl);
        pages.insert(
            url.as_str().to_string(),
            CachedPage {
                fetched_at: Instant::now(),
                result: result.clone(),
            },
        );
        result
    }
}

/// Shared page fetcher
///
/// Construct once at startup and pass around as `Arc<HttpFetcher>`.
pub struct HttpFetcher {
    client: Client,
    policy: RetryPolicy,
    pages: PageCache,
}

impl HttpFetcher {
    /// Build the pooled client from configuration
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .build()
            .map_err(FetchError::from_reqwest)?;

        Ok(Self {
            client,
            policy: RetryPolicy::from_config(config),
            pages: PageCache::new(Duration::from_secs(config.page_cache_secs)),
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Underlying client, for API calls that share the connection pool
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Fetch a page body as text, reusing a recent outcome for the same URL
    pub async fn fetch_html(&self, url: &Url) -> Result<Arc<str>, FetchError> {
        self.pages.get_or_fetch(url, || self.download(url)).await
    }

    async fn download(&self, url: &Url) -> Result<String, FetchError> {
        debug!(url = %url, "Fetching page");

        let client = &self.client;
        retry_with_backoff("fetch_html", &self.policy, move || async move {
            let response = client
                .get(url.clone())
                .send()
                .await
                .map_err(FetchError::from_reqwest)?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }

            response
                .text()
                .await
                .map_err(|e| FetchError::Body(e.to_string()))
        })
        .await
    }
}
