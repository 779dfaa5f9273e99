use crate::state::{Bucket, CheckResult, LinkRecord};
use std::collections::BTreeMap;
use std::io::{self, Write};

/// Aggregate counts for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub pages_crawled: usize,
    pub discovered: usize,
    pub checked: usize,
    pub skipped_external: usize,
    pub ok: usize,
    pub redirects: usize,
    pub dead_http: usize,
    pub errors: usize,
}

impl Summary {
    /// Adds one check result to the per-bucket counts
    pub fn tally(&mut self, result: &CheckResult) {
        match result.bucket() {
            Some(Bucket::Ok) => self.ok += 1,
            Some(Bucket::Redirect) => self.redirects += 1,
            Some(Bucket::DeadHttp) => self.dead_http += 1,
            Some(Bucket::Error) => self.errors += 1,
            None => {}
        }
    }
}

/// Settings echoed in the summary header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSettings {
    pub max_pages: usize,
    pub max_depth: u32,
    pub allow_external: bool,
    pub show_skipped: bool,
}

/// One dead link with where it was found
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLink {
    pub url: String,

    /// Final status; `None` for transport errors
    pub status: Option<u16>,

    pub error: Option<String>,

    /// Lexicographically first page linking here
    ///
    /// A crawled page is recorded as its own source; that entry is only used
    /// when nothing else links to the page.
    pub first_source: Option<String>,

    /// How many further pages link here
    pub other_sources: usize,
}

impl DeadLink {
    /// Builds the entry for a dead result, looking up its sources in `record`
    pub fn from_result(result: &CheckResult, record: Option<&LinkRecord>) -> Self {
        let (first_source, other_sources) = match record {
            Some(record) => {
                let mut referrers = record.sources.iter().filter(|s| **s != record.url);
                match referrers.next() {
                    Some(first) => (Some(first.clone()), referrers.count()),
                    None => (record.first_source().map(str::to_string), 0),
                }
            }
            None => (None, 0),
        };

        Self {
            url: result.url.clone(),
            status: result.status,
            error: result.error.as_ref().map(ToString::to_string),
            first_source,
            other_sources,
        }
    }

    /// Status code, or `ERR` for transport failures
    pub fn label(&self) -> String {
        match (self.error.is_some(), self.status) {
            (false, Some(code)) => code.to_string(),
            _ => "ERR".to_string(),
        }
    }
}

/// Everything printed at the end of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub summary: Summary,
    pub settings: ReportSettings,

    /// Dead links sorted by URL
    pub dead: Vec<DeadLink>,

    /// Counts per skip reason, plus `external`
    pub skipped: BTreeMap<String, usize>,
}

/// Writes the text report
///
/// # Format
///
/// ```text
/// DEAD  404    https://example.com/missing
///       found on: https://example.com/ (+2 more)
/// DEAD  ERR    https://example.com/slow
///       request timed out
///       found on: https://example.com/
///
/// Crawled pages: 1 (max-pages=200, max-depth=2)
/// Discovered links: 3
/// Checked links: 3
/// Skipped external: 0 (allow-external=false)
/// OK: 1  Redirects: 0  DeadHTTP: 1  Errors: 1
/// ```
///
/// followed by a `Skipped links:` breakdown when enabled and non-empty.
pub fn write_report<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
    for dead in &report.dead {
        writeln!(out, "DEAD  {:<5}  {}", dead.label(), dead.url)?;
        if let Some(error) = &dead.error {
            writeln!(out, "      {}", error)?;
        }
        if let Some(source) = &dead.first_source {
            if dead.other_sources > 0 {
                writeln!(out, "      found on: {} (+{} more)", source, dead.other_sources)?;
            } else {
                writeln!(out, "      found on: {}", source)?;
            }
        }
    }

    let summary = &report.summary;
    let settings = &report.settings;
    writeln!(out)?;
    writeln!(
        out,
        "Crawled pages: {} (max-pages={}, max-depth={})",
        summary.pages_crawled, settings.max_pages, settings.max_depth
    )?;
    writeln!(out, "Discovered links: {}", summary.discovered)?;
    writeln!(out, "Checked links: {}", summary.checked)?;
    writeln!(
        out,
        "Skipped external: {} (allow-external={})",
        summary.skipped_external, settings.allow_external
    )?;
    writeln!(
        out,
        "OK: {}  Redirects: {}  DeadHTTP: {}  Errors: {}",
        summary.ok, summary.redirects, summary.dead_http, summary.errors
    )?;

    if settings.show_skipped && !report.skipped.is_empty() {
        writeln!(out)?;
        writeln!(out, "Skipped links:")?;
        for (reason, count) in &report.skipped {
            writeln!(out, "  {:<20} {}", format!("{}:", reason), count)?;
        }
    }

    Ok(())
}
