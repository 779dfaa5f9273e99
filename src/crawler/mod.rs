//! Crawler module for site traversal and link discovery
//!
//! This module contains the crawl phase, including:
//! - HTML parsing and link extraction/classification
//! - Bounded breadth-first traversal of same-host pages
//! - Recording pages and links into the discovery index

mod coordinator;
mod parser;

pub use coordinator::{CrawlOptions, Crawler};
pub use parser::{ExtractError, HtmlExtractor, LinkExtractor};
