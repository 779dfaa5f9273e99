//! Progress reporting for long-running phases

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// A progress snapshot from one of the two phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Crawl {
        pages: usize,
        queued: usize,
        discovered: usize,
    },
    Check {
        checked: usize,
        total: usize,
        dead: usize,
        errors: usize,
    },
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Crawl {
                pages,
                queued,
                discovered,
            } => write!(
                f,
                "[crawl] pages={} queue={} discovered={}",
                pages, queued, discovered
            ),
            Self::Check {
                checked,
                total,
                dead,
                errors,
            } => write!(
                f,
                "[check] checked={}/{} dead={} errors={}",
                checked, total, dead, errors
            ),
        }
    }
}

/// Receives throttled progress snapshots
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Lets a progress line through at most once per interval
///
/// The interval is measured from creation, so nothing is reported during the
/// first `every` of a phase.
#[derive(Debug)]
pub struct ProgressThrottle {
    every: Duration,
    last: Instant,
}

impl ProgressThrottle {
    pub fn new(every: Duration) -> Self {
        Self {
            every,
            last: Instant::now(),
        }
    }

    /// Returns true, and restarts the interval, if at least `every` has elapsed
    pub fn ready(&mut self) -> bool {
        let now = Instant::now();
        if now.duration_since(self.last) >= self.every {
            self.last = now;
            true
        } else {
            false
        }
    }
}
