//! Check module for link liveness verification
//!
//! This module contains the check phase, including:
//! - The per-link HEAD/GET probe
//! - The bounded worker pool that runs probes concurrently

mod checker;
mod pool;

pub use checker::Checker;
pub use pool::check_all;
