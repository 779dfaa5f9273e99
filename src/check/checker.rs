//! Liveness probe for a single link
//!
//! This module handles:
//! - Rate limiting each probe like any other request
//! - HEAD first, falling back to GET when HEAD is refused or fails
//! - Draining a bounded amount of the GET body
//! - Timing the final attempt

use crate::fetch::{BodyMode, FetchError, FetchResponse, Fetcher, Method, RequestScope, DRAIN_LIMIT};
use crate::limiter::RateLimiter;
use crate::state::CheckResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// HEAD statuses that mean "try again with GET" rather than a verdict
const HEAD_REFUSED: [u16; 2] = [400, 405];

/// Verifies whether a URL is alive
#[derive(Clone)]
pub struct Checker {
    fetcher: Arc<dyn Fetcher>,
    limiter: Arc<dyn RateLimiter>,
    timeout: Duration,
    head_first: bool,
}

impl Checker {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        limiter: Arc<dyn RateLimiter>,
        timeout: Duration,
        head_first: bool,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            timeout,
            head_first,
        }
    }

    /// Checks one URL
    ///
    /// Never fails: transport errors, including cancellation of the run, are
    /// carried in the returned `CheckResult`.
    ///
    /// # Protocol
    ///
    /// | HEAD outcome | Action |
    /// |--------------|--------|
    /// | 400 or 405 | Retry with GET |
    /// | Transport error | Retry with GET |
    /// | Cancelled | Report the error |
    /// | Any other status | Report it |
    pub async fn check(&self, cancel: &CancellationToken, url: &str) -> CheckResult {
        let started = Instant::now();
        if let Err(e) = self.limiter.take(cancel, url).await {
            return CheckResult::failed(url, e.into(), started.elapsed());
        }

        if self.head_first {
            let started = Instant::now();
            let head = self.probe(cancel, Method::Head, url).await;
            if !needs_get(&head) {
                return into_result(url, head, started.elapsed());
            }
            tracing::debug!("HEAD {} inconclusive, retrying with GET", url);
        }

        let started = Instant::now();
        let get = self.probe(cancel, Method::Get, url).await;
        into_result(url, get, started.elapsed())
    }

    async fn probe(
        &self,
        cancel: &CancellationToken,
        method: Method,
        url: &str,
    ) -> Result<FetchResponse, FetchError> {
        let body = match method {
            Method::Head => BodyMode::Skip,
            Method::Get => BodyMode::Drain(DRAIN_LIMIT),
        };
        let scope = RequestScope::child_of(cancel, self.timeout);
        scope
            .run(self.fetcher.fetch(scope.request(method, url, body)))
            .await
    }
}

fn needs_get(head: &Result<FetchResponse, FetchError>) -> bool {
    match head {
        Ok(response) => HEAD_REFUSED.contains(&response.status),
        Err(FetchError::Cancelled) => false,
        Err(_) => true,
    }
}

fn into_result(url: &str, outcome: Result<FetchResponse, FetchError>, elapsed: Duration) -> CheckResult {
    match outcome {
        Ok(response) => CheckResult::status(url, response.status, elapsed),
        Err(e) => CheckResult::failed(url, e, elapsed),
    }
}
