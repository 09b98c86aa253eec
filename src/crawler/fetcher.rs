//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured identity
//! - The politeness delay before every request
//! - GET requests that treat any status code as data
//! - Link extraction from the fetched body
//! - Error classification

use crate::config::{ConnectionConfig, CrawlerConfig};
use crate::crawler::parser::extract_links;
use async_trait::async_trait;
use reqwest::header::REFERER;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Errors that end a fetch without a response
///
/// The display text is `"<Kind>: <message>"` and is stored verbatim as a
/// site's last error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("NetworkError: {0}")]
    NetworkError(String),

    #[error("InvalidUrl: {0}")]
    InvalidUrl(String),
}

/// A fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,

    /// HTTP status code; 4xx and 5xx are data, not errors
    pub status_code: u16,

    /// Raw response body
    pub content: String,

    /// Absolute HTTP(S) links found in the body
    pub links: Vec<String>,
}

/// Fetches single pages
///
/// The crawler and coordinator only see this trait, so tests can swap the
/// network for canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `connection` - The identity headers to send
/// * `crawler` - Timeout settings
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    connection: &ConnectionConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(connection.user_agent.clone())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages over HTTP with reqwest
pub struct HttpFetcher {
    client: Client,
    referrer: String,
    delay: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher from the connection and crawler config sections
    pub fn new(connection: &ConnectionConfig, crawler: &CrawlerConfig) -> Result<Self, FetchError> {
        let client = build_http_client(connection, crawler)
            .map_err(|e| FetchError::NetworkError(format!("failed to build client: {}", e)))?;

        Ok(Self {
            client,
            referrer: connection.referrer.clone(),
            delay: Duration::from_millis(crawler.request_delay_ms),
        })
    }

    /// Overrides the delay slept before each request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Fetches a URL and extracts its links
    ///
    /// # Request Flow
    ///
    /// 1. Sleep the politeness delay
    /// 2. Send GET with `User-Agent` and `Referer`, following up to 10 redirects
    /// 3. Read the body as text whatever the status and content type
    /// 4. Resolve every `a[href]` against the final URL
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let request_url =
            Url::parse(url).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", url, e)))?;

        tokio::time::sleep(self.delay).await;

        let mut request = self.client.get(request_url);
        if !self.referrer.is_empty() {
            request = request.header(REFERER, self.referrer.as_str());
        }

        let response = request.send().await.map_err(|e| {
            warn!("Fetch of {} failed: {}", url, e);
            classify_error(&e, url)
        })?;

        let status_code = response.status().as_u16();
        let final_url = response.url().clone();

        let content = response.text().await.map_err(|e| classify_error(&e, url))?;

        // Parsing is synchronous; the document is dropped before returning
        let links = extract_links(&content, &final_url);

        debug!(
            "Fetched {} ({}) with {} links",
            final_url,
            status_code,
            links.len()
        );

        Ok(FetchedPage {
            url: final_url.to_string(),
            status_code,
            content,
            links,
        })
    }
}

fn classify_error(error: &reqwest::Error, url: &str) -> FetchError {
    if error.is_timeout() {
        FetchError::NetworkError(format!("Request timeout for {}", url))
    } else if error.is_connect() {
        FetchError::NetworkError(format!("Connection failed for {}", url))
    } else if error.is_redirect() {
        FetchError::NetworkError(format!("Too many redirects from {}", url))
    } else {
        FetchError::NetworkError(error.to_string())
    }
}
