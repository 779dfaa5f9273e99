//! Output module for run reports and progress
//!
//! This module handles:
//! - The end-of-run report: dead links with sources, summary counts, skip breakdown
//! - Rendering that report as text
//! - Throttled progress snapshots for the crawl and check phases

mod progress;
mod report;

pub use progress::{Progress, ProgressCallback, ProgressThrottle};
pub use report::{write_report, DeadLink, ReportSettings, RunReport, Summary};
