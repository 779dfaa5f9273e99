//! HTTP fetching for the crawler and the checker
//!
//! This module defines the single capability both phases use to talk to the
//! network, including:
//! - The `Fetcher` trait and its request/response types
//! - A `reqwest`-backed production implementation
//! - `RequestScope`, the per-request cancellation scope and deadline

mod client;
mod scope;

pub use client::{build_http_client, ReqwestFetcher};
pub use scope::RequestScope;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Upper bound on body bytes read (and discarded) after a GET probe
pub const DRAIN_LIMIT: usize = 1 << 20;

/// HTTP method used for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Head,
    Get,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Get => "GET",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Head => reqwest::Method::HEAD,
            Method::Get => reqwest::Method::GET,
        }
    }
}

/// What to do with the response body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyMode {
    /// Do not read the body
    Skip,
    /// Read the whole body and return it as text
    Keep,
    /// Like `Keep` for HTML responses; any other body is left unread
    HtmlOnly,
    /// Read up to the given number of bytes and throw them away
    Drain(usize),
}

/// A single outbound request
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,

    /// Absolute deadline for the whole exchange, body included
    pub deadline: Instant,

    /// Child token of the run; cancelled when the request's scope ends
    pub cancel: CancellationToken,

    pub body: BodyMode,
}

/// The parts of a response the crawl and check phases look at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// Final status code after redirects were followed
    pub status: u16,

    /// URL after redirects
    pub final_url: String,

    /// Content-Type header value
    pub content_type: Option<String>,

    /// Page body; empty unless the request asked for it to be kept
    pub body: String,
}

impl FetchResponse {
    /// Returns true if the Content-Type denotes an HTML document
    pub fn is_html(&self) -> bool {
        is_html_content_type(self.content_type.as_deref())
    }
}

/// Returns true if a Content-Type header value denotes an HTML document
pub fn is_html_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| {
        let ct = ct.to_ascii_lowercase();
        ct.contains("text/html") || ct.contains("application/xhtml")
    })
}

/// Errors that can occur while performing a request
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    /// Classifies a reqwest error
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if err.is_builder() {
            Self::InvalidRequest(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Performs one HTTP request
///
/// Implementations follow redirects transparently and send a fixed User-Agent.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError>;
}
