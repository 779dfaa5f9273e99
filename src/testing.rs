//! In-memory doubles for the capability traits
//!
//! Used by the unit tests in this crate and by the integration tests to drive
//! the crawl and check phases without a network.

use crate::crawler::{ExtractError, LinkExtractor};
use crate::fetch::{BodyMode, FetchError, FetchRequest, FetchResponse, Fetcher, Method};
use crate::limiter::{LimiterError, RateLimiter};
use crate::state::{FoundLink, LinkRecord};
use crate::storage::{DiscoveryStore, MemoryStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
enum Canned {
    Response(FetchResponse),
    Error(FetchError),
    Hang,
}

/// `Fetcher` that serves canned responses keyed by URL
///
/// A response registered for a specific method wins over one registered for
/// any method. Unknown URLs answer 404 with no content type.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    canned: HashMap<(Option<Method>, String), Canned>,
    requests: Mutex<Vec<(Method, String)>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, method: Option<Method>, url: &str, canned: Canned) -> Self {
        self.canned.insert((method, url.to_string()), canned);
        self
    }

    /// Serves `body` as `text/html` with status 200
    pub fn html(self, url: &str, body: &str) -> Self {
        self.respond(url, 200, Some("text/html; charset=utf-8"), body)
    }

    pub fn respond(self, url: &str, status: u16, content_type: Option<&str>, body: &str) -> Self {
        let response = FetchResponse {
            status,
            final_url: url.to_string(),
            content_type: content_type.map(str::to_string),
            body: body.to_string(),
        };
        self.with(None, url, Canned::Response(response))
    }

    /// Answers only `method` with an empty-bodied status
    pub fn status_for(self, method: Method, url: &str, status: u16) -> Self {
        let response = FetchResponse {
            status,
            final_url: url.to_string(),
            content_type: None,
            body: String::new(),
        };
        self.with(Some(method), url, Canned::Response(response))
    }

    pub fn error(self, url: &str, error: FetchError) -> Self {
        self.with(None, url, Canned::Error(error))
    }

    pub fn error_for(self, method: Method, url: &str, error: FetchError) -> Self {
        self.with(Some(method), url, Canned::Error(error))
    }

    /// Never answers `url`
    pub fn hang(self, url: &str) -> Self {
        self.with(None, url, Canned::Hang)
    }

    /// Every request seen so far, in arrival order
    pub fn requests(&self) -> Vec<(Method, String)> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lookup(&self, method: Method, url: &str) -> Option<&Canned> {
        self.canned
            .get(&(Some(method), url.to_string()))
            .or_else(|| self.canned.get(&(None, url.to_string())))
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, FetchError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((request.method, request.url.clone()));

        match self.lookup(request.method, &request.url) {
            Some(Canned::Response(response)) => {
                let mut response = response.clone();
                let keep = match request.body {
                    BodyMode::Keep => true,
                    BodyMode::HtmlOnly => response.is_html(),
                    BodyMode::Skip | BodyMode::Drain(_) => false,
                };
                if !keep {
                    response.body.clear();
                }
                Ok(response)
            }
            Some(Canned::Error(error)) => Err(error.clone()),
            Some(Canned::Hang) => {
                request.cancel.cancelled().await;
                Err(FetchError::Cancelled)
            }
            None => Ok(FetchResponse {
                status: 404,
                final_url: request.url,
                content_type: None,
                body: String::new(),
            }),
        }
    }
}

/// `LinkExtractor` returning preset links per base URL
#[derive(Debug, Default)]
pub struct StubExtractor {
    links: HashMap<String, Vec<FoundLink>>,
    failing: Vec<String>,
}

impl StubExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn links(mut self, base_url: &str, links: Vec<FoundLink>) -> Self {
        self.links.insert(base_url.to_string(), links);
        self
    }

    /// Makes extraction from `base_url` fail
    pub fn fail(mut self, base_url: &str) -> Self {
        self.failing.push(base_url.to_string());
        self
    }
}

impl LinkExtractor for StubExtractor {
    fn extract(&self, base_url: &str, _body: &str) -> Result<Vec<FoundLink>, ExtractError> {
        if self.failing.iter().any(|u| u == base_url) {
            return Err(ExtractError::BaseUrl {
                url: base_url.to_string(),
                reason: "stubbed failure".to_string(),
            });
        }
        Ok(self.links.get(base_url).cloned().unwrap_or_default())
    }
}

/// `RateLimiter` that admits everything unless cancelled
#[derive(Debug, Default)]
pub struct UnlimitedLimiter {
    takes: AtomicUsize,
}

impl UnlimitedLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of admissions granted
    pub fn takes(&self) -> usize {
        self.takes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLimiter for UnlimitedLimiter {
    async fn take(&self, cancel: &CancellationToken, _url: &str) -> Result<(), LimiterError> {
        if cancel.is_cancelled() {
            return Err(LimiterError::Cancelled);
        }
        self.takes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// One call made against a `RecordingStore`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Visit(String),
    Record { url: String, source: String },
}

/// `DiscoveryStore` that logs every write before delegating to a `MemoryStore`
#[derive(Debug, Default)]
pub struct RecordingStore {
    inner: MemoryStore,
    calls: Mutex<Vec<StoreCall>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn log(&self, call: StoreCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl DiscoveryStore for RecordingStore {
    fn mark_visited_page(&self, url: &str) -> bool {
        self.log(StoreCall::Visit(url.to_string()));
        self.inner.mark_visited_page(url)
    }

    fn visited_count(&self) -> usize {
        self.inner.visited_count()
    }

    fn record_discovered_link(&self, record: LinkRecord, source_page: &str) {
        self.log(StoreCall::Record {
            url: record.url.clone(),
            source: source_page.to_string(),
        });
        self.inner.record_discovered_link(record, source_page);
    }

    fn discovered_count(&self) -> usize {
        self.inner.discovered_count()
    }

    fn all_discovered(&self) -> Vec<LinkRecord> {
        self.inner.all_discovered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::RequestScope;
    use std::time::Duration;

    #[tokio::test]
    async fn test_static_fetcher_method_precedence() {
        let fetcher = StaticFetcher::new()
            .html("https://a.test/", "<p>hi</p>")
            .status_for(Method::Head, "https://a.test/", 405);
        let scope = RequestScope::child_of(&CancellationToken::new(), Duration::from_secs(1));

        let head = fetcher
            .fetch(scope.request(Method::Head, "https://a.test/", BodyMode::Skip))
            .await
            .unwrap();
        let get = fetcher
            .fetch(scope.request(Method::Get, "https://a.test/", BodyMode::Keep))
            .await
            .unwrap();

        assert_eq!(head.status, 405);
        assert_eq!(get.status, 200);
        assert!(get.is_html());
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_static_fetcher_unknown_is_404() {
        let fetcher = StaticFetcher::new();
        let scope = RequestScope::child_of(&CancellationToken::new(), Duration::from_secs(1));
        let response = fetcher
            .fetch(scope.request(Method::Get, "https://a.test/none", BodyMode::Skip))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn test_static_fetcher_honours_body_mode() {
        let fetcher = StaticFetcher::new()
            .html("https://a.test/", "<p>hi</p>")
            .respond("https://a.test/f.bin", 200, Some("application/octet-stream"), "bytes");
        let scope = RequestScope::child_of(&CancellationToken::new(), Duration::from_secs(1));

        let page = fetcher
            .fetch(scope.request(Method::Get, "https://a.test/", BodyMode::HtmlOnly))
            .await
            .unwrap();
        let binary = fetcher
            .fetch(scope.request(Method::Get, "https://a.test/f.bin", BodyMode::HtmlOnly))
            .await
            .unwrap();

        assert_eq!(page.body, "<p>hi</p>");
        assert!(binary.body.is_empty());
        assert!(!binary.is_html());
    }

    #[tokio::test]
    async fn test_unlimited_limiter_counts() {
        let limiter = UnlimitedLimiter::new();
        let cancel = CancellationToken::new();
        limiter.take(&cancel, "https://a.test/").await.unwrap();
        cancel.cancel();
        assert!(limiter.take(&cancel, "https://a.test/").await.is_err());
        assert_eq!(limiter.takes(), 1);
    }

    #[test]
    fn test_recording_store_logs() {
        let store = RecordingStore::new();
        store.mark_visited_page("https://a.test/");
        store.record_discovered_link(LinkRecord::page("https://a.test/x", 0), "https://a.test/");

        assert_eq!(store.calls().len(), 2);
        assert_eq!(store.all_discovered().len(), 1);
    }

    #[test]
    fn test_stub_extractor_failure() {
        let extractor = StubExtractor::new().fail("https://a.test/");
        assert!(extractor.extract("https://a.test/", "").is_err());
        assert!(extractor.extract("https://b.test/", "").unwrap().is_empty());
    }
}
