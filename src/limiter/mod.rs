//! Request admission control shared by the crawl and check phases
//!
//! This module handles:
//! - The `RateLimiter` capability trait
//! - A global token bucket consulted before every request
//! - Lazily created per-host token buckets keyed by lowercased hostname
//! - Tying every refill task to the run's cancellation scope

mod bucket;

pub use bucket::{TokenBucket, REFILL_PERIOD};

use crate::fetch::FetchError;
use crate::url::host_of;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio_util::sync::{CancellationToken, DropGuard};

/// Errors returned while waiting for admission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LimiterError {
    #[error("rate limiter wait cancelled")]
    Cancelled,

    #[error("rate limiter shut down")]
    Closed,
}

impl From<LimiterError> for FetchError {
    fn from(err: LimiterError) -> Self {
        match err {
            LimiterError::Cancelled => FetchError::Cancelled,
            LimiterError::Closed => FetchError::Transport(err.to_string()),
        }
    }
}

/// Admission control for outbound requests
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Blocks until a request to `url` may proceed, or `cancel` fires
    ///
    /// URLs that do not parse or carry no host are admitted immediately.
    async fn take(&self, cancel: &CancellationToken, url: &str) -> Result<(), LimiterError>;
}

/// Global plus per-host token-bucket limiter
///
/// Both buckets must yield a token, global first, before a request proceeds.
/// All refill tasks run under a child of the scope passed to [`DualScopeLimiter::new`]
/// and stop when that scope is cancelled or the limiter is dropped.
pub struct DualScopeLimiter {
    global: TokenBucket,
    per_host_rate: usize,
    hosts: Mutex<HashMap<String, Arc<TokenBucket>>>,
    shutdown: CancellationToken,
    _guard: DropGuard,
}

impl DualScopeLimiter {
    /// Creates a limiter whose refill tasks live no longer than `scope`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(global_rate: usize, per_host_rate: usize, scope: &CancellationToken) -> Self {
        let shutdown = scope.child_token();
        Self {
            global: TokenBucket::spawn(global_rate, shutdown.clone()),
            per_host_rate,
            hosts: Mutex::new(HashMap::new()),
            _guard: shutdown.clone().drop_guard(),
            shutdown,
        }
    }

    /// Returns the bucket for `host`, creating it on first use
    fn host_bucket(&self, host: &str) -> Arc<TokenBucket> {
        let mut hosts = self.hosts.lock().unwrap_or_else(PoisonError::into_inner);
        let bucket = hosts.entry(host.to_string()).or_insert_with(|| {
            tracing::trace!("Creating per-host bucket for {}", host);
            Arc::new(TokenBucket::spawn(self.per_host_rate, self.shutdown.clone()))
        });
        Arc::clone(bucket)
    }

    /// Number of distinct hosts seen so far
    pub fn host_count(&self) -> usize {
        self.hosts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Stops every refill task and closes all buckets
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl RateLimiter for DualScopeLimiter {
    async fn take(&self, cancel: &CancellationToken, url: &str) -> Result<(), LimiterError> {
        let Some(host) = host_of(url) else {
            return Ok(());
        };

        self.global.take(cancel).await?;
        let bucket = self.host_bucket(&host);
        bucket.take(cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_malformed_url_is_noop() {
        let scope = CancellationToken::new();
        let limiter = DualScopeLimiter::new(1, 1, &scope);
        let cancel = CancellationToken::new();

        for _ in 0..5 {
            limiter.take(&cancel, "not a url").await.unwrap();
            limiter.take(&cancel, "mailto:a@b.test").await.unwrap();
        }
        assert_eq!(limiter.host_count(), 0);
        assert_eq!(limiter.global.available(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_host_buckets_keyed_by_lowercase_host() {
        let scope = CancellationToken::new();
        let limiter = DualScopeLimiter::new(100, 100, &scope);
        let cancel = CancellationToken::new();

        limiter.take(&cancel, "https://Example.com/a").await.unwrap();
        limiter.take(&cancel, "https://example.com:8443/b").await.unwrap();
        limiter.take(&cancel, "https://other.test/").await.unwrap();
        assert_eq!(limiter.host_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_host_limit_applies_despite_global_budget() {
        let scope = CancellationToken::new();
        let limiter = DualScopeLimiter::new(100, 1, &scope);
        let cancel = CancellationToken::new();

        let started = Instant::now();
        limiter.take(&cancel, "https://a.test/1").await.unwrap();
        limiter.take(&cancel, "https://a.test/2").await.unwrap();
        assert!(started.elapsed() >= REFILL_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_hosts_do_not_share_budget() {
        let scope = CancellationToken::new();
        let limiter = DualScopeLimiter::new(100, 1, &scope);
        let cancel = CancellationToken::new();

        let started = Instant::now();
        limiter.take(&cancel, "https://a.test/").await.unwrap();
        limiter.take(&cancel, "https://b.test/").await.unwrap();
        assert!(started.elapsed() < REFILL_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_limit_applies_across_hosts() {
        let scope = CancellationToken::new();
        let limiter = DualScopeLimiter::new(1, 100, &scope);
        let cancel = CancellationToken::new();

        let started = Instant::now();
        limiter.take(&cancel, "https://a.test/").await.unwrap();
        limiter.take(&cancel, "https://b.test/").await.unwrap();
        assert!(started.elapsed() >= REFILL_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_take() {
        let scope = CancellationToken::new();
        let limiter = DualScopeLimiter::new(1, 1, &scope);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(
            limiter.take(&cancel, "https://a.test/").await,
            Err(LimiterError::Cancelled)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scope_cancel_shuts_buckets() {
        let scope = CancellationToken::new();
        let limiter = DualScopeLimiter::new(1, 1, &scope);
        let cancel = CancellationToken::new();
        limiter.take(&cancel, "https://a.test/").await.unwrap();

        scope.cancel();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(limiter.global.is_closed());
        assert_eq!(
            limiter.take(&cancel, "https://a.test/").await,
            Err(LimiterError::Closed)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_refill_tasks() {
        let scope = CancellationToken::new();
        let limiter = DualScopeLimiter::new(1, 1, &scope);
        let shutdown = limiter.shutdown.clone();
        drop(limiter);
        assert!(shutdown.is_cancelled());
        assert!(!scope.is_cancelled());
    }
}
