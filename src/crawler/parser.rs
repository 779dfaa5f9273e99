//! HTML link extraction
//!
//! This module handles parsing a fetched page and turning its references into
//! candidate links:
//! - `<a href>` targets become page links
//! - `<img src>`, `<script src>` and `<link href>` targets become asset links
//! - Unusable hrefs are kept with a skip reason instead of being dropped
//! - Duplicates within one page are collapsed

use crate::state::{FoundLink, LinkKind, SkipReason};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Errors raised while extracting links from a page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("parse base url {url}: {reason}")]
    BaseUrl { url: String, reason: String },

    #[error("invalid link selector: {0}")]
    Selector(String),
}

/// Turns an HTML document into the links it references
pub trait LinkExtractor: Send + Sync {
    /// Extracts every candidate link from `body`, resolved against `base_url`
    ///
    /// Only the first occurrence of each link is returned. Checkable links are
    /// keyed by their resolved URL; skipped links by reason, kind and raw text.
    fn extract(&self, base_url: &str, body: &str) -> Result<Vec<FoundLink>, ExtractError>;
}

/// Elements and attributes that reference other resources
const LINK_SELECTOR: &str = "a[href], img[src], script[src], link[href]";

/// `scraper`-backed `LinkExtractor`
#[derive(Debug, Clone)]
pub struct HtmlExtractor {
    selector: Selector,
}

impl HtmlExtractor {
    pub fn new() -> Result<Self, ExtractError> {
        let selector =
            Selector::parse(LINK_SELECTOR).map_err(|e| ExtractError::Selector(e.to_string()))?;
        Ok(Self { selector })
    }
}

impl LinkExtractor for HtmlExtractor {
    fn extract(&self, base_url: &str, body: &str) -> Result<Vec<FoundLink>, ExtractError> {
        let base = Url::parse(base_url).map_err(|e| ExtractError::BaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let document = Html::parse_document(body);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for element in document.select(&self.selector) {
            let Some((raw, kind)) = reference_of(&element) else {
                continue;
            };

            let link = classify(raw, kind, &base);
            if seen.insert(dedup_key(&link)) {
                links.push(link);
            }
        }

        tracing::trace!("Extracted {} links from {}", links.len(), base_url);
        Ok(links)
    }
}

/// Returns the referencing attribute value and link kind of an element
fn reference_of<'a>(element: &ElementRef<'a>) -> Option<(&'a str, LinkKind)> {
    let value = element.value();
    match value.name() {
        "a" => value.attr("href").map(|href| (href, LinkKind::Page)),
        "img" | "script" => value.attr("src").map(|src| (src, LinkKind::Asset)),
        "link" => value.attr("href").map(|href| (href, LinkKind::Asset)),
        _ => None,
    }
}

/// Classifies one attribute value
///
/// The checks are exclusive and applied in order: empty, fragment-only,
/// unparsable, non-http(s) scheme. Anything else is resolved against `base`
/// with its fragment removed.
fn classify(raw: &str, kind: LinkKind, base: &Url) -> FoundLink {
    let raw = raw.trim();

    if raw.is_empty() {
        return FoundLink::skipped(raw, kind, SkipReason::Empty);
    }

    if raw.starts_with('#') {
        return FoundLink::skipped(raw, kind, SkipReason::FragmentOnly);
    }

    let mut resolved = match base.join(raw) {
        Ok(url) => url,
        Err(_) => return FoundLink::skipped(raw, kind, SkipReason::InvalidUrl),
    };

    if !matches!(resolved.scheme(), "http" | "https") {
        return FoundLink::skipped(raw, kind, SkipReason::UnsupportedScheme);
    }

    resolved.set_fragment(None);
    FoundLink::checkable(resolved, kind, raw)
}

/// Key under which a link is deduplicated within one page
fn dedup_key(link: &FoundLink) -> String {
    match link.skip_reason {
        Some(reason) => format!("{}|{}|{}", reason, link.kind, link.raw),
        None => link.url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/docs/index.html";

    fn extract(body: &str) -> Vec<FoundLink> {
        HtmlExtractor::new().unwrap().extract(BASE, body).unwrap()
    }

    #[test]
    fn test_resolves_relative_links() {
        let links = extract(r#"<a href="guide.html">g</a><a href="/about">a</a>"#);
        let urls: Vec<_> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://example.com/docs/guide.html", "https://example.com/about"]
        );
        assert!(links.iter().all(|l| l.kind == LinkKind::Page));
        assert_eq!(links[0].raw, "guide.html");
    }

    #[test]
    fn test_asset_tags() {
        let links = extract(
            r#"<html><head>
                <link rel="stylesheet" href="/style.css">
                <script src="/app.js"></script>
            </head><body><img src="logo.png"></body></html>"#,
        );
        assert_eq!(links.len(), 3);
        assert!(links.iter().all(|l| l.kind == LinkKind::Asset));
        assert!(links
            .iter()
            .any(|l| l.url == "https://example.com/docs/logo.png"));
    }

    #[test]
    fn test_inline_script_ignored() {
        let links = extract("<script>var a = 1;</script><img alt=\"none\">");
        assert!(links.is_empty());
    }

    #[test]
    fn test_fragment_stripped_and_deduped() {
        let links = extract(
            r#"<a href="/a#one">1</a><a href="/a#two">2</a><a href="https://example.com/a">3</a>"#,
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/a");
        assert_eq!(links[0].raw, "/a#one");
    }

    #[test]
    fn test_empty_href() {
        let links = extract(r#"<a href="">x</a><a href="   ">y</a>"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].skip_reason, Some(SkipReason::Empty));
        assert!(links[0].url.is_empty());
    }

    #[test]
    fn test_fragment_only_href() {
        let links = extract(r##"<a href="#top">top</a>"##);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].skip_reason, Some(SkipReason::FragmentOnly));
        assert_eq!(links[0].raw, "#top");
    }

    #[test]
    fn test_invalid_href() {
        let links = extract(r#"<a href="http://[::1">bad</a>"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].skip_reason, Some(SkipReason::InvalidUrl));
    }

    #[test]
    fn test_unsupported_schemes_kept_distinct() {
        let links = extract(
            r#"<a href="mailto:a@example.com">m</a>
               <a href="tel:+123">t</a>
               <a href="javascript:void(0)">j</a>
               <a href="mailto:a@example.com">again</a>"#,
        );
        assert_eq!(links.len(), 3);
        assert!(links
            .iter()
            .all(|l| l.skip_reason == Some(SkipReason::UnsupportedScheme)));
    }

    #[test]
    fn test_same_raw_different_kind_not_collapsed() {
        let links = extract(r#"<a href="data:,x">a</a><img src="data:,x">"#);
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn test_absolute_other_host_kept() {
        let links = extract(r#"<a href="https://other.test/page">o</a>"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://other.test/page");
        assert!(links[0].skip_reason.is_none());
    }

    #[test]
    fn test_bad_base_url() {
        let result = HtmlExtractor::new().unwrap().extract("not a url", "<a href=\"/x\">x</a>");
        assert!(matches!(result, Err(ExtractError::BaseUrl { .. })));
    }
}
