//! Per-request cancellation scope
//!
//! Every outbound request runs under its own child of the run's cancellation
//! token and its own deadline. A slow page can only exhaust its own deadline,
//! and cancelling the run reaches every in-flight request.

use crate::fetch::{BodyMode, FetchError, FetchRequest, Method};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

/// A child cancellation scope with a deadline, released when dropped
pub struct RequestScope {
    token: CancellationToken,
    deadline: Instant,
    _guard: DropGuard,
}

impl RequestScope {
    /// Opens a scope under `parent` that expires after `timeout`
    pub fn child_of(parent: &CancellationToken, timeout: Duration) -> Self {
        let token = parent.child_token();
        Self {
            _guard: token.clone().drop_guard(),
            token,
            deadline: Instant::now() + timeout,
        }
    }

    /// Builds a request bound to this scope
    pub fn request(&self, method: Method, url: &str, body: BodyMode) -> FetchRequest {
        FetchRequest {
            method,
            url: url.to_string(),
            deadline: self.deadline,
            cancel: self.token.clone(),
            body,
        }
    }

    /// Drives `work` until it completes, the deadline passes, or the scope is cancelled
    pub async fn run<T, F>(&self, work: F) -> Result<T, FetchError>
    where
        F: Future<Output = Result<T, FetchError>>,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(FetchError::Cancelled),
            outcome = tokio::time::timeout_at(self.deadline, work) => {
                outcome.unwrap_or(Err(FetchError::Timeout))
            }
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}
