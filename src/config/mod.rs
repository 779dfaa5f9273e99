//! Configuration module for Deadlink-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Command-line flags are layered on top of the loaded values by the binary.
//!
//! # Example
//!
//! ```no_run
//! use deadlink_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("deadlink.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawl.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CheckConfig, Config, CrawlConfig, HttpConfig, OutputConfig, RateConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, parse_config, parse_duration,
};
pub use validation::validate;
