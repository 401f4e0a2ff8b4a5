//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the scraper, including:
//! - Building the HTTP session shared by every fetch of a run
//! - Rotating the User-Agent header per request
//! - Retry logic for transient failures
//! - Error classification

use crate::config::{ScraperConfig, UserAgentConfig};
use rand::seq::IndexedRandom;
use reqwest::{header::USER_AGENT, redirect::Policy, Client};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Errors that can occur while fetching a page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    /// Returns true if the failure is worth another attempt
    ///
    /// | Condition | Retried |
    /// |-----------|---------|
    /// | Timeout | yes |
    /// | Connection failure | yes |
    /// | HTTP 5xx | yes |
    /// | HTTP 4xx | no |
    /// | Body read / other | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Body { .. } | Self::Request { .. } => false,
        }
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_connect() {
            Self::Connect {
                url,
                message: error.to_string(),
            }
        } else {
            Self::Request {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub final_url: Url,

    /// HTTP status code
    pub status_code: u16,

    /// Page body content
    pub body: String,
}

/// The HTTP session used for every fetch of a run
///
/// Created once at start, borrowed by the pagination driver for each page,
/// and dropped when the run ends.
#[derive(Debug)]
pub struct HttpSession {
    client: Client,
    user_agents: Vec<String>,
    retries: u32,
    retry_backoff: Duration,
}

impl HttpSession {
    /// Builds the session from the run configuration
    ///
    /// # Returns
    ///
    /// * `Ok(HttpSession)` - Successfully built session
    /// * `Err(reqwest::Error)` - Failed to build the underlying client
    ///
    /// # Example
    ///
    /// ```no_run
    /// use shop_scraper::config::Config;
    /// use shop_scraper::crawler::HttpSession;
    ///
    /// let config = Config::default();
    /// let session = HttpSession::new(&config.scraper, &config.user_agent).unwrap();
    /// ```
    pub fn new(
        scraper: &ScraperConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(scraper.request_timeout())?;

        Ok(Self {
            client,
            user_agents: user_agent.agents.clone(),
            retries: scraper.retries,
            retry_backoff: scraper.retry_backoff(),
        })
    }

    /// Fetches a page, retrying transient failures with a fixed backoff
    ///
    /// At most `retries + 1` requests are sent for one call, and no retry
    /// starts at or after `deadline`.
    pub async fn fetch_page(
        &self,
        url: &Url,
        deadline: Option<Instant>,
    ) -> Result<FetchedPage, FetchError> {
        let mut attempt = 0;

        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(e)
                    if e.is_retryable()
                        && attempt < self.retries
                        && self.retry_fits(deadline) =>
                {
                    attempt += 1;
                    tracing::warn!(
                        "{} (attempt {}/{}), retrying in {:?}",
                        e,
                        attempt,
                        self.retries + 1,
                        self.retry_backoff
                    );
                    tokio::time::sleep(self.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn retry_fits(&self, deadline: Option<Instant>) -> bool {
        deadline.map_or(true, |deadline| {
            Instant::now()
                .checked_add(self.retry_backoff)
                .is_some_and(|resume| resume < deadline)
        })
    }

    async fn fetch_once(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let user_agent = self.pick_user_agent();
        tracing::trace!("GET {} as {}", url, user_agent);

        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(FetchedPage {
            final_url,
            status_code: status.as_u16(),
            body,
        })
    }

    /// Picks a random User-Agent from the pool
    fn pick_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(DEFAULT_AGENT)
    }
}

/// Sent only if the pool is empty, which validation rejects
const DEFAULT_AGENT: &str = concat!("shop-scraper/", env!("CARGO_PKG_VERSION"));

/// Builds an HTTP client with the scraper's transport settings
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}
