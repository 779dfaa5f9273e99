//! Token bucket with a once-per-second, non-accumulating refill

use crate::limiter::LimiterError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// How often a bucket is topped back up to capacity
pub const REFILL_PERIOD: Duration = Duration::from_secs(1);

/// A bucket of `capacity` tokens refilled by a background task
///
/// The bucket starts full. Once per `REFILL_PERIOD` the refill task adds tokens
/// until the bucket holds `capacity` again; tokens beyond capacity are never
/// banked. The refill task ends when `shutdown` is cancelled, which also closes
/// the bucket so no caller can wait on it forever.
#[derive(Debug)]
pub struct TokenBucket {
    tokens: Arc<Semaphore>,
    capacity: usize,
}

impl TokenBucket {
    /// Creates a bucket and spawns its refill task on the current runtime
    pub fn spawn(capacity: usize, shutdown: CancellationToken) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        let tokens = Arc::new(Semaphore::new(capacity));

        let refill = Arc::clone(&tokens);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + REFILL_PERIOD, REFILL_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        refill.close();
                        break;
                    }
                    _ = ticker.tick() => {
                        let missing = capacity.saturating_sub(refill.available_permits());
                        if missing > 0 {
                            refill.add_permits(missing);
                        }
                    }
                }
            }
        });

        Self { tokens, capacity }
    }

    /// Waits for one token, or until `cancel` fires
    pub async fn take(&self, cancel: &CancellationToken) -> Result<(), LimiterError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(LimiterError::Cancelled),
            acquired = self.tokens.acquire() => {
                acquired.map_err(|_| LimiterError::Closed)?.forget();
                Ok(())
            }
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Tokens currently available without waiting
    pub fn available(&self) -> usize {
        self.tokens.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.tokens.is_closed()
    }
}
