//! State module for the per-run data model
//!
//! # Components
//!
//! - `LinkRecord`: one entry per normalized URL ever discovered, merged across pages
//! - `FoundLink`: a single href as classified by the extractor
//! - `PageJob`: a crawl queue item
//! - `CheckResult`: the verdict of one liveness probe

mod link;
mod result;

// Re-export main types
pub use link::{FoundLink, LinkKind, LinkRecord, PageJob, SkipReason};
pub use result::{Bucket, CheckResult};
