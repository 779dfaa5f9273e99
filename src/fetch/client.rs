//! reqwest-backed `Fetcher`
//!
//! This module handles the real network traffic for both phases, including:
//! - Building the HTTP client with the configured User-Agent
//! - Following redirects so the reported status is the final one
//! - Reading, keeping or draining the response body within the request deadline
//! - Classifying transport failures

use crate::config::HttpConfig;
use crate::fetch::{
    is_html_content_type, BodyMode, FetchError, FetchRequest, FetchResponse, Fetcher,
};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client, Response};
use std::time::Duration;
use tokio::time::Instant;

/// Maximum number of redirect hops followed before giving up
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The HTTP configuration (User-Agent and timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use deadlink_sweep::config::HttpConfig;
/// use deadlink_sweep::fetch::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.timeout)
        .connect_timeout(config.timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Production `Fetcher` backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
}

impl ReqwestFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| FetchError::InvalidRequest(format!("{}: {}", request.url, e)))?;

        let remaining = request.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(FetchError::Timeout);
        }

        let response = self
            .client
            .request(request.method.into(), url)
            .timeout(remaining)
            .send()
            .await
            .map_err(FetchError::from_reqwest)?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = match request.body {
            BodyMode::Skip => String::new(),
            BodyMode::Keep => response.text().await.map_err(FetchError::from_reqwest)?,
            BodyMode::HtmlOnly if is_html_content_type(content_type.as_deref()) => {
                response.text().await.map_err(FetchError::from_reqwest)?
            }
            // Dropping the response closes the connection without reading the body
            BodyMode::HtmlOnly => String::new(),
            BodyMode::Drain(limit) => {
                drain(response, limit).await?;
                String::new()
            }
        };

        Ok(FetchResponse {
            status,
            final_url,
            content_type,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        tokio::select! {
            biased;
            _ = request.cancel.cancelled() => Err(FetchError::Cancelled),
            outcome = self.send(&request) => outcome,
        }
    }
}

/// Reads and discards up to `limit` body bytes so the connection can be reused
async fn drain(mut response: Response, limit: usize) -> Result<usize, FetchError> {
    let mut read = 0;
    while read < limit {
        match response.chunk().await.map_err(FetchError::from_reqwest)? {
            Some(chunk) => read += chunk.len(),
            None => break,
        }
    }
    Ok(read)
}
