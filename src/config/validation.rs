use crate::config::types::{CheckConfig, Config, CrawlConfig, HttpConfig, OutputConfig, RateConfig};
use crate::ConfigError;

/// Upper bound on the worker pool size
const MAX_CONCURRENCY: usize = 1000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_check_config(&config.check)?;
    validate_rate_config(&config.rate)?;
    validate_http_config(&config.http)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl configuration
///
/// The start URL is not checked here; it is validated when the crawl starts so
/// that a malformed URL is reported as a start-URL error.
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    // max_depth >= 0 is always true for u32, so no check needed

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

/// Validates check configuration
fn validate_check_config(config: &CheckConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    Ok(())
}

/// Validates rate limits
fn validate_rate_config(config: &RateConfig) -> Result<(), ConfigError> {
    if config.global < 1 {
        return Err(ConfigError::Validation(format!(
            "rate must be >= 1 request/sec, got {}",
            config.global
        )));
    }

    if config.per_host < 1 {
        return Err(ConfigError::Validation(format!(
            "per-host-rate must be >= 1 request/sec, got {}",
            config.per_host
        )));
    }

    Ok(())
}

/// Validates HTTP client configuration
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.timeout.is_zero() {
        return Err(ConfigError::Validation("timeout must be > 0".to_string()));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.progress_every.is_zero() {
        return Err(ConfigError::Validation(
            "progress-every must be > 0".to_string(),
        ));
    }

    Ok(())
}
