// ABOUTME: URL helpers for turning scraped href values into absolute URLs.
// ABOUTME: Provides resolve_url() and origin() used by the news extractor.

use url::Url;

/// Returns `scheme://host` for a URL, dropping port, path, query and fragment.
///
/// A part the URL does not have is left empty, so an unparseable value
/// yields `"://"`.
pub fn origin(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => format!("{}://{}", parsed.scheme(), parsed.host_str().unwrap_or("")),
        Err(_) => "://".to_string(),
    }
}

/// Returns true when `raw` is a complete URL with both a scheme and a host.
fn is_absolute(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| u.host_str().is_some_and(|h| !h.is_empty()))
        .unwrap_or(false)
}

/// Resolves a raw href against the page it was found on.
///
/// - absolute URLs are returned unchanged
/// - values starting with `/` are appended to the page origin
/// - anything else is appended to the origin after exactly one `/`
///
/// The page path is never used as a base and neither is its port. This
/// never fails: malformed values take the relative join.
pub fn resolve_url(base: &str, raw: &str) -> String {
    if is_absolute(raw) {
        return raw.to_string();
    }

    let origin = origin(base);
    let origin = origin.trim_end_matches('/');

    if raw.starts_with('/') {
        format!("{}{}", origin, raw)
    } else {
        format!("{}/{}", origin, raw.trim_start_matches('/'))
    }
}
