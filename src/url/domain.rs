use crate::{UrlError, UrlResult};
use url::Url;

/// Extracts the lowercased hostname from a URL string
///
/// The port is not part of the result, so `http://example.com:8080/` and
/// `https://example.com/` share the host `example.com`.
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the URL does not parse or has no host
///
/// # Examples
///
/// ```
/// use deadlink_sweep::url::host_of;
///
/// assert_eq!(host_of("https://EXAMPLE.COM/path"), Some("example.com".to_string()));
/// assert_eq!(host_of("mailto:a@example.com"), None);
/// assert_eq!(host_of("/relative"), None);
/// ```
pub fn host_of(raw: &str) -> Option<String> {
    Url::parse(raw)
        .ok()
        .and_then(|url| url.host_str().map(|h| h.to_lowercase()))
        .filter(|h| !h.is_empty())
}

/// Parses and validates the URL a crawl starts from
///
/// The start URL must be non-empty, absolute, use http or https, and carry a host.
/// Any failure here is fatal for the run.
pub fn parse_start_url(raw: &str) -> UrlResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Empty);
    }

    let url = Url::parse(raw).map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost(raw.to_string()));
    }

    Ok(url)
}
