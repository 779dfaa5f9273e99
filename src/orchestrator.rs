//! Run orchestration
//!
//! This module ties the two phases together:
//! - Crawl once to fill the discovery index
//! - Partition discovered links into checkable, skipped and external
//! - Check the checkable set with a bounded worker pool
//! - Aggregate results into a sorted, deterministic report

use crate::check::{check_all, Checker};
use crate::config::Config;
use crate::crawler::{CrawlOptions, Crawler, HtmlExtractor};
use crate::fetch::ReqwestFetcher;
use crate::limiter::DualScopeLimiter;
use crate::output::{
    DeadLink, Progress, ProgressCallback, ProgressThrottle, ReportSettings, RunReport, Summary,
};
use crate::state::LinkRecord;
use crate::storage::{DiscoveryStore, MemoryStore};
use crate::url::is_external;
use crate::{DeadlinkError, UrlError};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Skip-breakdown key for links on other hosts
pub const SKIP_EXTERNAL: &str = "external";

/// Check-phase settings
#[derive(Debug, Clone)]
pub struct CheckOptions {
    pub concurrency: usize,
    pub allow_external: bool,
    pub progress_every: Duration,
}

/// Discovered links split by what happens to them
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Partition {
    /// URLs to check, sorted ascending
    pub checkable: Vec<String>,

    /// Counts per skip reason, plus `external`
    pub skipped: BTreeMap<String, usize>,

    pub external: usize,
}

/// Splits a discovery snapshot into checkable links and skip counts
///
/// A URL whose host cannot be determined is still checked; the probe reports
/// why it is unusable.
pub fn partition(discovered: &[LinkRecord], start_host: &str, allow_external: bool) -> Partition {
    let mut result = Partition::default();

    for record in discovered {
        if let Some(reason) = record.skip_reason {
            *result.skipped.entry(reason.to_string()).or_default() += 1;
            continue;
        }

        if is_external(&record.url, start_host) && !allow_external {
            *result.skipped.entry(SKIP_EXTERNAL.to_string()).or_default() += 1;
            result.external += 1;
            continue;
        }

        result.checkable.push(record.url.clone());
    }

    result.checkable.sort();
    result
}

/// Runs the crawl phase then the check phase
pub struct Orchestrator {
    crawler: Crawler,
    checker: Checker,
    store: Arc<dyn DiscoveryStore>,
    options: CheckOptions,
    settings: ReportSettings,
    progress: Option<ProgressCallback>,
}

impl Orchestrator {
    pub fn new(
        crawler: Crawler,
        checker: Checker,
        store: Arc<dyn DiscoveryStore>,
        options: CheckOptions,
        settings: ReportSettings,
    ) -> Self {
        Self {
            crawler,
            checker,
            store,
            options,
            settings,
            progress: None,
        }
    }

    /// Reports check-phase progress to `callback`
    ///
    /// Crawl-phase progress is configured on the `Crawler` itself.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Runs both phases for `start_url` and builds the report
    ///
    /// # Returns
    ///
    /// * `Ok(RunReport)` - The run completed; dead links are in the report
    /// * `Err(DeadlinkError)` - The start URL was unusable or the crawl was cancelled
    pub async fn run(
        &self,
        cancel: &CancellationToken,
        start_url: &str,
    ) -> Result<RunReport, DeadlinkError> {
        let start_host = self
            .crawler
            .crawl(cancel, start_url, self.store.as_ref())
            .await?;

        let discovered = self.store.all_discovered();
        let split = partition(&discovered, &start_host, self.options.allow_external);
        let total = split.checkable.len();

        tracing::info!(
            "Checking {} of {} discovered links with {} workers",
            total,
            discovered.len(),
            self.options.concurrency
        );

        let mut throttle = ProgressThrottle::new(self.options.progress_every);
        let (mut checked, mut dead, mut errors) = (0, 0, 0);
        let mut results = check_all(
            &self.checker,
            split.checkable,
            self.options.concurrency,
            cancel,
            |result| {
                checked += 1;
                if result.error.is_some() {
                    errors += 1;
                } else if result.is_dead() {
                    dead += 1;
                }
                if throttle.ready() {
                    if let Some(callback) = &self.progress {
                        callback(&Progress::Check {
                            checked,
                            total,
                            dead,
                            errors,
                        });
                    }
                }
            },
        )
        .await;
        results.sort_by(|a, b| a.url.cmp(&b.url));

        let by_url: HashMap<&str, &LinkRecord> =
            discovered.iter().map(|r| (r.url.as_str(), r)).collect();

        let mut summary = Summary {
            pages_crawled: self.store.visited_count(),
            discovered: discovered.len(),
            checked: total,
            skipped_external: split.external,
            ..Summary::default()
        };
        let mut dead_links = Vec::new();
        for result in &results {
            summary.tally(result);
            if result.is_dead() {
                dead_links.push(DeadLink::from_result(
                    result,
                    by_url.get(result.url.as_str()).copied(),
                ));
            }
        }

        tracing::info!(
            "Check finished: {} ok, {} redirects, {} dead, {} errors",
            summary.ok,
            summary.redirects,
            summary.dead_http,
            summary.errors
        );

        Ok(RunReport {
            summary,
            settings: self.settings,
            dead: dead_links,
            skipped: split.skipped,
        })
    }
}

/// Runs a full sweep with the production implementations
///
/// # Arguments
///
/// * `config` - A validated configuration with a start URL
/// * `cancel` - The run's cancellation token
/// * `progress` - Optional observer for both phases
///
/// # Returns
///
/// * `Ok(RunReport)` - The run completed
/// * `Err(DeadlinkError)` - Setup failed, the start URL was unusable, or the run was cancelled
pub async fn run(
    config: &Config,
    cancel: &CancellationToken,
    progress: Option<ProgressCallback>,
) -> Result<RunReport, DeadlinkError> {
    let start_url = config
        .crawl
        .start_url
        .as_deref()
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .ok_or(UrlError::Empty)?;

    let fetcher = Arc::new(ReqwestFetcher::new(&config.http)?);
    let extractor = Arc::new(HtmlExtractor::new()?);
    let limiter = Arc::new(DualScopeLimiter::new(
        config.rate.global,
        config.rate.per_host,
        cancel,
    ));

    let mut crawler = Crawler::new(
        fetcher.clone(),
        extractor,
        limiter.clone(),
        CrawlOptions {
            timeout: config.http.timeout,
            max_depth: config.crawl.max_depth,
            max_pages: config.crawl.max_pages,
            check_assets: config.crawl.check_assets,
            progress_every: config.output.progress_every,
        },
    );
    if let Some(callback) = &progress {
        crawler = crawler.with_progress(Arc::clone(callback));
    }

    let checker = Checker::new(
        fetcher,
        limiter.clone(),
        config.http.timeout,
        config.check.head_first,
    );

    let mut orchestrator = Orchestrator::new(
        crawler,
        checker,
        Arc::new(MemoryStore::new()),
        CheckOptions {
            concurrency: config.check.concurrency,
            allow_external: config.check.allow_external,
            progress_every: config.output.progress_every,
        },
        ReportSettings {
            max_pages: config.crawl.max_pages,
            max_depth: config.crawl.max_depth,
            allow_external: config.check.allow_external,
            show_skipped: config.output.show_skipped,
        },
    );
    if let Some(callback) = progress {
        orchestrator = orchestrator.with_progress(callback);
    }

    let report = orchestrator.run(cancel, start_url).await;
    limiter.shutdown();
    report
}
