use url::Url;

/// Normalizes a URL into the canonical key used for dedup throughout a run
///
/// # Normalization Steps
///
/// 1. Parse the URL as an absolute URL; anything that does not parse is returned
///    unchanged (raw hrefs recorded for skip reporting keep their original text)
/// 2. Remove the fragment (everything after #)
/// 3. Lowercase the host (the port is kept when it is not the scheme default)
///
/// Unlike a crawler frontier key, the path, query and scheme are left alone: two
/// URLs that differ there may well differ in liveness.
///
/// # Examples
///
/// ```
/// use deadlink_sweep::url::normalize_key;
///
/// assert_eq!(
///     normalize_key("https://EXAMPLE.com:8443/Page#top"),
///     "https://example.com:8443/Page"
/// );
/// assert_eq!(normalize_key("mailto:someone@example.com"), "mailto:someone@example.com");
/// ```
pub fn normalize_key(raw: &str) -> String {
    let mut url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.to_string(),
    };

    url.set_fragment(None);

    // Special schemes already get a lowercased host from the parser; opaque hosts
    // of other schemes do not.
    if let Some(host) = url.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host && url.set_host(Some(&lowered)).is_err() {
            tracing::trace!("Could not lowercase host of {}", raw);
        }
    }

    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_fragment() {
        assert_eq!(
            normalize_key("https://example.com/page#section"),
            "https://example.com/page"
        );
    }

    #[test]
    fn test_lowercase_host() {
        assert_eq!(
            normalize_key("https://EXAMPLE.COM/Page"),
            "https://example.com/Page"
        );
    }

    #[test]
    fn test_keep_non_default_port() {
        assert_eq!(
            normalize_key("http://Example.com:8080/a#b"),
            "http://example.com:8080/a"
        );
    }

    #[test]
    fn test_default_port_dropped() {
        assert_eq!(normalize_key("http://example.com:80/a"), "http://example.com/a");
    }

    #[test]
    fn test_query_and_trailing_slash_preserved() {
        assert_eq!(
            normalize_key("https://example.com/page/?b=2&a=1"),
            "https://example.com/page/?b=2&a=1"
        );
    }

    #[test]
    fn test_relative_text_unchanged() {
        assert_eq!(normalize_key("/relative/path"), "/relative/path");
        assert_eq!(normalize_key("#section"), "#section");
        assert_eq!(normalize_key(""), "");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize_key("https://Example.com/x?y=1#z");
        assert_eq!(normalize_key(&once), once);
    }

    #[test]
    fn test_non_http_scheme_keeps_shape() {
        assert_eq!(normalize_key("tel:+123"), "tel:+123");
    }
}
