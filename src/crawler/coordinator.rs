//! Crawl coordinator - bounded breadth-first traversal
//!
//! This module contains the crawl loop that fills the discovery index,
//! including:
//! - Managing the FIFO page queue and the depth/page budgets
//! - Rate limiting and fetching one page at a time
//! - Recording every page and every link it references
//! - Restricting traversal to the start host

use crate::crawler::LinkExtractor;
use crate::fetch::{BodyMode, FetchError, Fetcher, Method, RequestScope};
use crate::limiter::RateLimiter;
use crate::output::{Progress, ProgressCallback, ProgressThrottle};
use crate::state::{FoundLink, LinkKind, LinkRecord, PageJob};
use crate::storage::DiscoveryStore;
use crate::url::{is_external, parse_start_url};
use crate::DeadlinkError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Budgets and switches for one crawl
#[derive(Debug, Clone)]
pub struct CrawlOptions {
    /// Deadline for each page fetch
    pub timeout: Duration,

    /// Deepest level fetched; the start page is depth 0
    pub max_depth: u32,

    /// Maximum number of distinct pages fetched
    pub max_pages: usize,

    /// Record asset links (img/script/link) for checking
    pub check_assets: bool,

    /// Minimum interval between progress callbacks
    pub progress_every: Duration,
}

/// Sequential crawler
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<dyn LinkExtractor>,
    limiter: Arc<dyn RateLimiter>,
    options: CrawlOptions,
    progress: Option<ProgressCallback>,
}

/// Outcome of fetching a single page
enum PageOutcome {
    /// HTML that was parsed into links
    Links(Vec<FoundLink>),
    /// Fetched but not followed (error, non-HTML, unparsable)
    Leaf,
}

impl Crawler {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        extractor: Arc<dyn LinkExtractor>,
        limiter: Arc<dyn RateLimiter>,
        options: CrawlOptions,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            limiter,
            options,
            progress: None,
        }
    }

    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    /// Crawls the site reachable from `start_url` and records what it finds
    ///
    /// # Arguments
    ///
    /// * `cancel` - The run's cancellation token
    /// * `start_url` - Absolute http(s) URL of the first page
    /// * `store` - The discovery index to fill
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The lowercased start host, used for same-host scoping
    /// * `Err(DeadlinkError)` - The start URL was unusable or the run was cancelled
    pub async fn crawl(
        &self,
        cancel: &CancellationToken,
        start_url: &str,
        store: &dyn DiscoveryStore,
    ) -> Result<String, DeadlinkError> {
        let start = parse_start_url(start_url)?;
        let start_host = start
            .host_str()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        tracing::info!(
            "Crawling {} (max-depth={}, max-pages={})",
            start,
            self.options.max_depth,
            self.options.max_pages
        );

        let mut queue = VecDeque::from([PageJob {
            url: start.to_string(),
            depth: 0,
        }]);
        let mut crawled = 0usize;
        let mut throttle = ProgressThrottle::new(self.options.progress_every);

        while crawled < self.options.max_pages {
            if cancel.is_cancelled() {
                return Err(DeadlinkError::Cancelled);
            }

            let Some(job) = queue.pop_front() else {
                break;
            };

            if job.depth > self.options.max_depth {
                tracing::trace!("Depth {} exceeds budget, dropping {}", job.depth, job.url);
                continue;
            }

            if !store.mark_visited_page(&job.url) {
                continue;
            }
            crawled += 1;

            self.limiter
                .take(cancel, &job.url)
                .await
                .map_err(|_| DeadlinkError::Cancelled)?;

            tracing::debug!("Fetching page {} (depth {})", job.url, job.depth);
            let outcome = self.fetch_page(cancel, &job).await?;

            store.record_discovered_link(LinkRecord::page(&job.url, job.depth), &job.url);
            if let PageOutcome::Links(links) = outcome {
                for link in links {
                    if let Some(next) = self.record_link(store, &job, link, &start_host) {
                        queue.push_back(next);
                    }
                }
            }

            if throttle.ready() {
                self.report(Progress::Crawl {
                    pages: crawled,
                    queued: queue.len(),
                    discovered: store.discovered_count(),
                });
            }
        }

        tracing::info!(
            "Crawl finished: {} pages fetched, {} still queued",
            crawled,
            queue.len()
        );
        Ok(start_host)
    }

    /// Fetches one page under its own request scope
    ///
    /// Only cancellation of the run is an error; every per-page failure turns
    /// the page into a leaf.
    async fn fetch_page(
        &self,
        cancel: &CancellationToken,
        job: &PageJob,
    ) -> Result<PageOutcome, DeadlinkError> {
        let scope = RequestScope::child_of(cancel, self.options.timeout);
        let request = scope.request(Method::Get, &job.url, BodyMode::HtmlOnly);
        let fetched = scope.run(self.fetcher.fetch(request)).await;
        drop(scope);

        let response = match fetched {
            Ok(response) => response,
            Err(FetchError::Cancelled) if cancel.is_cancelled() => {
                return Err(DeadlinkError::Cancelled)
            }
            Err(e) => {
                tracing::warn!("Failed to fetch page {}: {}", job.url, e);
                return Ok(PageOutcome::Leaf);
            }
        };

        if !response.is_html() {
            tracing::debug!(
                "Not following {} (content type {:?})",
                job.url,
                response.content_type
            );
            return Ok(PageOutcome::Leaf);
        }

        match self.extractor.extract(&job.url, &response.body) {
            Ok(links) => Ok(PageOutcome::Links(links)),
            Err(e) => {
                tracing::warn!("Failed to extract links from {}: {}", job.url, e);
                Ok(PageOutcome::Leaf)
            }
        }
    }

    /// Records one link found on `job`, returning the job to enqueue, if any
    fn record_link(
        &self,
        store: &dyn DiscoveryStore,
        job: &PageJob,
        link: FoundLink,
        start_host: &str,
    ) -> Option<PageJob> {
        if link.is_skipped() {
            let mut record = LinkRecord::new(&link.raw, link.kind, job.depth);
            if let Some(reason) = link.skip_reason {
                record = record.with_skip_reason(reason);
            }
            store.record_discovered_link(record, &job.url);
            return None;
        }

        if link.kind == LinkKind::Asset && !self.options.check_assets {
            return None;
        }

        store.record_discovered_link(LinkRecord::new(&link.url, link.kind, job.depth), &job.url);

        if link.kind != LinkKind::Page
            || is_external(&link.url, start_host)
            || job.depth >= self.options.max_depth
        {
            return None;
        }

        Some(PageJob {
            url: link.url,
            depth: job.depth + 1,
        })
    }

    fn report(&self, progress: Progress) {
        if let Some(callback) = &self.progress {
            callback(&progress);
        }
    }
}
