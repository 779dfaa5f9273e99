use crate::config::parser::deserialize_duration;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Deadlink-Sweep
///
/// Every field has a default, so an empty file (or no file) is a valid
/// configuration apart from the start URL, which must come from somewhere.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub check: CheckConfig,
    pub rate: RateConfig,
    pub http: HttpConfig,
    pub output: OutputConfig,
}

/// Crawl phase configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CrawlConfig {
    /// URL the crawl starts from
    pub start_url: Option<String>,

    /// Maximum crawl depth (0 = only the start page)
    pub max_depth: u32,

    /// Maximum number of distinct pages fetched
    pub max_pages: usize,

    /// Whether img/script/link targets are recorded and checked
    pub check_assets: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            start_url: None,
            max_depth: 2,
            max_pages: 200,
            check_assets: true,
        }
    }
}

/// Check phase configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct CheckConfig {
    /// Number of concurrent link checks
    pub concurrency: usize,

    /// Try HEAD before GET
    pub head_first: bool,

    /// Also check links on other hosts
    pub allow_external: bool,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            concurrency: 20,
            head_first: true,
            allow_external: false,
        }
    }
}

/// Request rate limits, in requests per second
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct RateConfig {
    /// Shared across all hosts
    pub global: usize,

    /// Applied to each host separately
    pub per_host: usize,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self {
            global: 10,
            per_host: 2,
        }
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct HttpConfig {
    /// Per-request timeout (e.g. "10s")
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: format!("deadlink-sweep/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputConfig {
    /// Minimum interval between progress lines
    #[serde(deserialize_with = "deserialize_duration")]
    pub progress_every: Duration,

    /// Print the per-reason skipped-link breakdown
    pub show_skipped: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            progress_every: Duration::from_secs(1),
            show_skipped: true,
        }
    }
}
