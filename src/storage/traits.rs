//! Storage trait for the per-run discovery index
//!
//! This module defines the interface the crawler writes to and the
//! orchestrator reads from.

use crate::state::LinkRecord;

/// In-memory index of visited pages and discovered links for one run
///
/// Implementations must be safe to share between tasks. All keys are
/// normalized with [`crate::url::normalize_key`] before use.
pub trait DiscoveryStore: Send + Sync {
    // ===== Visited Pages =====

    /// Marks a page as visited
    ///
    /// # Returns
    ///
    /// `true` only the first time a given normalized URL is marked
    fn mark_visited_page(&self, url: &str) -> bool;

    /// Number of distinct pages marked visited
    fn visited_count(&self) -> usize;

    // ===== Discovered Links =====

    /// Records one observation of a link found on `source_page`
    ///
    /// A new URL is inserted; a known URL is merged (minimum depth, union of
    /// sources, kind and skip reason only ever upgraded). An empty
    /// `source_page` adds no source.
    fn record_discovered_link(&self, record: LinkRecord, source_page: &str);

    /// Number of distinct discovered links
    fn discovered_count(&self) -> usize;

    /// Returns a snapshot of every discovered link, sorted by URL
    fn all_discovered(&self) -> Vec<LinkRecord>;
}
