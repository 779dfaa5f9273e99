//! Deadlink-Sweep: a same-site dead link finder
//!
//! This crate crawls a website from one start URL, discovers outbound links up to a
//! bounded depth and page count, then verifies every discovered link with HTTP
//! probes and reports the dead ones together with the pages that link to them.

pub mod check;
pub mod config;
pub mod crawler;
pub mod fetch;
pub mod limiter;
pub mod orchestrator;
pub mod output;
pub mod state;
pub mod storage;
pub mod testing;
pub mod url;

use thiserror::Error;

/// Main error type for Deadlink-Sweep operations
#[derive(Debug, Error)]
pub enum DeadlinkError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid start URL: {0}")]
    StartUrl(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("Link extractor error: {0}")]
    Extractor(#[from] crawler::ExtractError),

    #[error("Run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid duration '{0}' (expected e.g. 500ms, 10s, 2m)")]
    InvalidDuration(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("start url is required")]
    Empty,

    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL: {0}")]
    MissingHost(String),
}

/// Result type alias for Deadlink-Sweep operations
pub type Result<T> = std::result::Result<T, DeadlinkError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use orchestrator::{run, Orchestrator};
pub use output::{write_report, Progress, RunReport};
pub use state::{CheckResult, LinkKind, LinkRecord, SkipReason};
pub use crate::url::{host_of, normalize_key};
