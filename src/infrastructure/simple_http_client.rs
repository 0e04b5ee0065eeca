//! HTTP client for page fetching
//!
//! This module provides the [`PageFetcher`] seam used by the scheduler and its
//! reqwest-backed implementation. Every page gets exactly one attempt; callers
//! decide what a failure means.

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::infrastructure::config::HttpConfig;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("HTTP request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("HTTP error {status}: {url}")]
    Status { url: String, status: u16 },

    #[error("Empty response from {url}")]
    EmptyBody { url: String },

    #[error("Failed to create HTTP client: {0}")]
    Client(String),
}

/// Single GET-by-URL capability returning the raw body
#[async_trait]
pub trait PageFetcher: Send + Sync + 'static {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Configuration for HTTP client behavior
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
    /// Whether to follow redirects
    pub follow_redirects: bool,
}

impl HttpClientConfig {
    /// Create HttpClientConfig from the `http` configuration section
    pub fn from_http_config(http: &HttpConfig) -> Self {
        Self {
            timeout_seconds: http.request_timeout_seconds,
            user_agent: http.user_agent.clone(),
            follow_redirects: http.follow_redirects,
        }
    }
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from_http_config(&HttpConfig::default())
    }
}

/// reqwest-backed [`PageFetcher`]
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self, FetchError> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .redirect(if config.follow_redirects {
                reqwest::redirect::Policy::limited(10)
            } else {
                reqwest::redirect::Policy::none()
            })
            .build()
            .map_err(|e| FetchError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}

#[async_trait]
impl PageFetcher for HttpClient {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        info!("🌐 HTTP GET: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("❌ HTTP error {}: {}", status, url);
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| FetchError::Request {
            url: url.to_string(),
            message: format!("Failed to read response body: {e}"),
        })?;

        if body.is_empty() {
            return Err(FetchError::EmptyBody {
                url: url.to_string(),
            });
        }

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}
