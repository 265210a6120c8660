//! Item page fetcher
//!
//! Builds the page URL from the configured template and performs a single
//! GET bounded by the caller's deadline. When the deadline fires the request
//! future is dropped, which closes its connection; idle pooling is disabled
//! so nothing outlives an invocation.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::config::ScraperConfig;
use super::scrape_error::FetchError;
use crate::domain::ItemId;

/// Unparsed page body, owned by one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub url: String,
    pub body: String,
}

/// Retrieves the raw item page for a validated identifier
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Deterministic target URL for an identifier
    fn page_url(&self, item_id: &ItemId) -> String;

    async fn fetch(&self, item_id: &ItemId, deadline: Duration) -> Result<RawDocument, FetchError>;
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: Client,
    config: ScraperConfig,
}

impl HttpPageFetcher {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .user_agent(&config.user_agent)
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .pool_max_idle_per_host(0)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub const fn config(&self) -> &ScraperConfig {
        &self.config
    }

    async fn fetch_once(&self, url: &str, deadline: Duration) -> Result<RawDocument, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport_error(url, deadline, &e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP request failed with status {}: {}", status, url);
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport_error(url, deadline, &e))?;

        debug!("Successfully fetched: {} ({} chars)", url, body.len());
        Ok(RawDocument {
            url: url.to_string(),
            body,
        })
    }

    async fn fetch_with_retry(&self, url: &str, deadline: Duration) -> Result<RawDocument, FetchError> {
        match self.fetch_once(url, deadline).await {
            Err(err) if err.is_transient() && self.config.retry_on_network_failure => {
                warn!("Retrying once after transient failure: {}", err);
                self.fetch_once(url, deadline).await
            }
            result => result,
        }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    fn page_url(&self, item_id: &ItemId) -> String {
        self.config.page_url(item_id)
    }

    async fn fetch(&self, item_id: &ItemId, deadline: Duration) -> Result<RawDocument, FetchError> {
        let url = self.page_url(item_id);
        info!("Fetching URL: {}", url);

        let started = Instant::now();
        let result = tokio::time::timeout(deadline, self.fetch_with_retry(&url, deadline))
            .await
            .map_err(|_| {
                warn!("Request to {} exceeded deadline of {:?}", url, deadline);
                FetchError::timeout(&url, deadline)
            })?;

        debug!("Fetch of {} finished in {:?}", url, started.elapsed());
        result
    }
}

fn classify_transport_error(url: &str, deadline: Duration, error: &reqwest::Error) -> FetchError {
    if error.is_timeout() {
        return FetchError::timeout(url, deadline);
    }
    FetchError::network_failure(url, error_chain(error))
}

/// reqwest's Display hides the underlying cause (DNS, refused, reset)
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
