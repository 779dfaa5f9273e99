//! URL handling module for Deadlink-Sweep
//!
//! This module provides the canonical dedup key used by the discovery index,
//! hostname extraction for same-host scoping, and start-URL validation.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{host_of, parse_start_url};
pub use normalize::normalize_key;

/// Returns true if `url` lives on a host other than `start_host`
///
/// URLs without a parsable host are never external; they are handled (and
/// rejected) by the component that tries to use them.
pub fn is_external(url: &str, start_host: &str) -> bool {
    match host_of(url) {
        Some(host) => host != start_host,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_host_not_external() {
        assert!(!is_external("https://example.com/a", "example.com"));
    }

    #[test]
    fn test_same_host_other_port_not_external() {
        assert!(!is_external("http://example.com:8080/a", "example.com"));
    }

    #[test]
    fn test_other_host_external() {
        assert!(is_external("https://other.example/a", "example.com"));
        assert!(is_external("https://sub.example.com/a", "example.com"));
    }

    #[test]
    fn test_hostless_not_external() {
        assert!(!is_external("not a url", "example.com"));
    }
}
