/// Outcome of verifying one link
use crate::fetch::FetchError;
use std::time::Duration;

/// Result of a single liveness check
#[derive(Debug)]
pub struct CheckResult {
    pub url: String,

    /// Final HTTP status after redirects; `None` when the probe failed
    pub status: Option<u16>,

    pub error: Option<FetchError>,

    /// Wall-clock time of the final attempt
    pub elapsed: Duration,
}

impl CheckResult {
    pub fn status(url: impl Into<String>, status: u16, elapsed: Duration) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            error: None,
            elapsed,
        }
    }

    pub fn failed(url: impl Into<String>, error: FetchError, elapsed: Duration) -> Self {
        Self {
            url: url.into(),
            status: None,
            error: Some(error),
            elapsed,
        }
    }

    /// A link is dead if the probe failed or the final status is 400 or above
    pub fn is_dead(&self) -> bool {
        self.error.is_some() || self.status.is_some_and(|code| code >= 400)
    }

    /// Returns the summary bucket for this result, if it falls in one
    pub fn bucket(&self) -> Option<Bucket> {
        if self.error.is_some() {
            return Some(Bucket::Error);
        }
        match self.status? {
            200..=299 => Some(Bucket::Ok),
            300..=399 => Some(Bucket::Redirect),
            code if code >= 400 => Some(Bucket::DeadHttp),
            _ => None,
        }
    }
}

/// Summary classification of a check result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// 2xx
    Ok,
    /// 3xx that survived redirect following
    Redirect,
    /// 4xx and 5xx
    DeadHttp,
    /// Transport-level failure
    Error,
}
