//! Storage module for the per-run discovery index
//!
//! This module handles everything the crawler learns during one run:
//! - The visited-page set, so each page is fetched at most once
//! - The discovered-link map with merge semantics
//! - Sorted snapshots for the check and report phases
//!
//! Nothing is persisted; the index is dropped with the run.

mod memory;
mod traits;

pub use memory::MemoryStore;
pub use traits::DiscoveryStore;
