/// Link definitions for the discovery index
///
/// This module defines what the crawler learns about each URL it encounters.
use std::collections::BTreeSet;
use std::fmt;

/// How a link was referenced from the page it was found on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    /// Referenced by `<img src>`, `<script src>` or `<link href>`; checked, never crawled
    Asset,

    /// Referenced by `<a href>`; checked, and crawled when on the start host
    Page,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Page => "page",
            Self::Asset => "asset",
        }
    }

    /// Merges two observations of the same URL
    ///
    /// `Page` dominates, so the result does not depend on the order in which a URL
    /// was seen as an anchor and as an asset.
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }
}

impl fmt::Display for LinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why an href was captured for reporting but never checked or crawled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SkipReason {
    /// The attribute was present but blank
    Empty,

    /// The href points at an anchor on the same page (`#section`)
    FragmentOnly,

    /// The href could not be parsed as a URI reference
    InvalidUrl,

    /// The href resolves to a scheme other than http/https (mailto:, tel:, ...)
    UnsupportedScheme,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::FragmentOnly => "fragment_only",
            Self::InvalidUrl => "invalid_url",
            Self::UnsupportedScheme => "unsupported_scheme",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One candidate link produced by the extractor for a single page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoundLink {
    /// Resolved, fragment-stripped absolute URL; empty when skipped
    pub url: String,

    pub kind: LinkKind,

    /// Set only for hrefs that must not be checked
    pub skip_reason: Option<SkipReason>,

    /// The attribute value as written (trimmed)
    pub raw: String,
}

impl FoundLink {
    /// A checkable link
    pub fn checkable(url: impl Into<String>, kind: LinkKind, raw: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind,
            skip_reason: None,
            raw: raw.into(),
        }
    }

    /// A link captured only for skip reporting
    pub fn skipped(raw: impl Into<String>, kind: LinkKind, reason: SkipReason) -> Self {
        Self {
            url: String::new(),
            kind,
            skip_reason: Some(reason),
            raw: raw.into(),
        }
    }

    /// Returns true if this link must never be queued or checked
    pub fn is_skipped(&self) -> bool {
        self.skip_reason.is_some() || self.url.is_empty()
    }
}

/// A traversal work item; lives only in the crawl queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageJob {
    pub url: String,
    pub depth: u32,
}

/// Everything known about one normalized URL discovered during a run
///
/// Records are only ever merged: `first_seen_depth` can only decrease and
/// `sources` can only grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkRecord {
    /// Canonical key (see [`crate::url::normalize_key`])
    pub url: String,

    pub kind: LinkKind,

    /// Minimum crawl depth at which this URL was observed
    pub first_seen_depth: u32,

    /// Normalized URLs of the pages that link here
    pub sources: BTreeSet<String>,

    pub skip_reason: Option<SkipReason>,
}

impl LinkRecord {
    pub fn new(url: impl Into<String>, kind: LinkKind, depth: u32) -> Self {
        Self {
            url: url.into(),
            kind,
            first_seen_depth: depth,
            sources: BTreeSet::new(),
            skip_reason: None,
        }
    }

    /// A page-kind record, used for pages the crawler fetched itself
    pub fn page(url: impl Into<String>, depth: u32) -> Self {
        Self::new(url, LinkKind::Page, depth)
    }

    pub fn with_skip_reason(mut self, reason: SkipReason) -> Self {
        self.skip_reason = Some(reason);
        self
    }

    /// Returns true if this link is eligible for liveness verification
    pub fn is_checkable(&self) -> bool {
        self.skip_reason.is_none()
    }

    /// The lexicographically first source page, if any
    pub fn first_source(&self) -> Option<&str> {
        self.sources.iter().next().map(String::as_str)
    }

    /// Folds another observation of the same URL into this record
    ///
    /// Commutative and idempotent: depth takes the minimum, sources are unioned,
    /// and a skip reason is only ever set, never cleared.
    pub fn merge(&mut self, other: LinkRecord) {
        self.first_seen_depth = self.first_seen_depth.min(other.first_seen_depth);
        self.kind = self.kind.merge(other.kind);
        if other.skip_reason.is_some() {
            self.skip_reason = other.skip_reason;
        }
        self.sources.extend(other.sources);
    }
}
