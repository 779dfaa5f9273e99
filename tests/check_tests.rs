//! Integration tests for the check phase building blocks
//!
//! These tests run the production fetcher, checker and limiter against
//! wiremock servers.

use deadlink_sweep::check::{check_all, Checker};
use deadlink_sweep::config::HttpConfig;
use deadlink_sweep::fetch::{BodyMode, FetchError, Fetcher, Method, ReqwestFetcher, RequestScope};
use deadlink_sweep::limiter::{DualScopeLimiter, RateLimiter};
use deadlink_sweep::testing::UnlimitedLimiter;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_http_config() -> HttpConfig {
    HttpConfig {
        timeout: Duration::from_secs(2),
        user_agent: "deadlink-sweep-test/1.0".to_string(),
    }
}

fn fetcher() -> Arc<ReqwestFetcher> {
    Arc::new(ReqwestFetcher::new(&create_test_http_config()).expect("Failed to build client"))
}

fn checker(timeout: Duration, head_first: bool) -> Checker {
    Checker::new(fetcher(), Arc::new(UnlimitedLimiter::new()), timeout, head_first)
}

#[tokio::test]
async fn test_fetcher_keeps_html_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .and(header("user-agent", "deadlink-sweep-test/1.0"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hello</p>", "text/html"))
        .expect(1)
        .mount(&server)
        .await;

    let scope = RequestScope::child_of(&CancellationToken::new(), Duration::from_secs(2));
    let url = format!("{}/page", server.uri());
    let response = fetcher()
        .fetch(scope.request(Method::Get, &url, BodyMode::Keep))
        .await
        .expect("Fetch failed");

    assert_eq!(response.status, 200);
    assert!(response.is_html());
    assert_eq!(response.body, "<p>hello</p>");
}

#[tokio::test]
async fn test_fetcher_html_only_leaves_binary_unread() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/disk.iso"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0u8; 20 << 20], "application/octet-stream"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>hello</p>", "text/html"))
        .mount(&server)
        .await;

    let scope = RequestScope::child_of(&CancellationToken::new(), Duration::from_secs(2));
    let binary = fetcher()
        .fetch(scope.request(Method::Get, &format!("{}/disk.iso", server.uri()), BodyMode::HtmlOnly))
        .await
        .expect("Fetch failed");
    let page = fetcher()
        .fetch(scope.request(Method::Get, &format!("{}/page", server.uri()), BodyMode::HtmlOnly))
        .await
        .expect("Fetch failed");

    assert_eq!(binary.status, 200);
    assert!(!binary.is_html());
    assert!(binary.body.is_empty());
    assert_eq!(page.body, "<p>hello</p>");
}

#[tokio::test]
async fn test_fetcher_drain_discards_body() {
    let server = MockServer::start().await;
    Mock::given(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 3 << 20]))
        .mount(&server)
        .await;

    let scope = RequestScope::child_of(&CancellationToken::new(), Duration::from_secs(5));
    let url = format!("{}/big", server.uri());
    let response = fetcher()
        .fetch(scope.request(Method::Get, &url, BodyMode::Drain(1 << 20)))
        .await
        .expect("Fetch failed");

    assert_eq!(response.status, 200);
    assert!(response.body.is_empty());
}

#[tokio::test]
async fn test_fetcher_connection_refused() {
    let scope = RequestScope::child_of(&CancellationToken::new(), Duration::from_secs(2));
    let result = fetcher()
        .fetch(scope.request(Method::Head, "http://127.0.0.1:9/", BodyMode::Skip))
        .await;

    assert!(result.is_err());
    assert_ne!(result, Err(FetchError::Cancelled));
}

#[tokio::test]
async fn test_checker_follows_redirects() {
    let server = MockServer::start().await;
    Mock::given(path("/old"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/new", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(path("/new"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let result = checker(Duration::from_secs(2), true)
        .check(&CancellationToken::new(), &format!("{}/old", server.uri()))
        .await;

    assert_eq!(result.status, Some(200));
    assert!(!result.is_dead());
}

#[tokio::test]
async fn test_checker_head_405_then_get() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(405))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let result = checker(Duration::from_secs(2), true)
        .check(&CancellationToken::new(), &format!("{}/x", server.uri()))
        .await;
    assert_eq!(result.status, Some(204));
}

#[tokio::test]
async fn test_checker_head_500_is_final() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = checker(Duration::from_secs(2), true)
        .check(&CancellationToken::new(), &format!("{}/x", server.uri()))
        .await;
    assert_eq!(result.status, Some(500));
    assert!(result.is_dead());
}

#[tokio::test]
async fn test_checker_get_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let result = checker(Duration::from_secs(2), false)
        .check(&CancellationToken::new(), &format!("{}/x", server.uri()))
        .await;
    assert_eq!(result.status, Some(200));
}

#[tokio::test]
async fn test_checker_timeout() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let started = Instant::now();
    let result = checker(Duration::from_millis(300), true)
        .check(&CancellationToken::new(), &format!("{}/slow", server.uri()))
        .await;

    assert!(result.error.is_some());
    assert!(result.is_dead());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_pool_isolates_slow_links() {
    let server = MockServer::start().await;
    Mock::given(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;
    Mock::given(path("/ok"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let urls = vec![
        format!("{}/ok", server.uri()),
        format!("{}/slow", server.uri()),
        format!("{}/ok?n=2", server.uri()),
        format!("{}/ok?n=3", server.uri()),
    ];
    let results = check_all(
        &checker(Duration::from_millis(300), true),
        urls,
        2,
        &CancellationToken::new(),
        |_| {},
    )
    .await;

    assert_eq!(results.len(), 4);
    assert_eq!(results.iter().filter(|r| r.status == Some(200)).count(), 3);
    assert_eq!(results.iter().filter(|r| r.error.is_some()).count(), 1);
}

#[tokio::test]
async fn test_limiter_throttles_per_host() {
    let scope = CancellationToken::new();
    let limiter = DualScopeLimiter::new(100, 2, &scope);
    let cancel = CancellationToken::new();

    let started = Instant::now();
    for _ in 0..3 {
        limiter
            .take(&cancel, "http://127.0.0.1/")
            .await
            .expect("Take failed");
    }
    assert!(started.elapsed() >= Duration::from_millis(900));
    scope.cancel();
}

#[tokio::test]
async fn test_limiter_cancel_unblocks_waiters() {
    let scope = CancellationToken::new();
    let limiter = Arc::new(DualScopeLimiter::new(1, 1, &scope));
    let cancel = CancellationToken::new();
    limiter
        .take(&cancel, "http://a.test/")
        .await
        .expect("Take failed");

    let waiter = {
        let limiter = Arc::clone(&limiter);
        let cancel = cancel.clone();
        tokio::spawn(async move { limiter.take(&cancel, "http://a.test/").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let outcome = waiter.await.expect("Waiter panicked");
    assert!(outcome.is_err());
}
