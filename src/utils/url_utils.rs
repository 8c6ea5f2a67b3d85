//! URL manipulation utilities.
//!
//! Domain extraction and normalization used by the per-domain learning
//! caches and the content cache keys.

use url::Url;

/// Extract the host portion of a URL, normalized for per-domain tracking
///
/// Strips a leading `www.` and lowercases so `https://WWW.Example.com/x`
/// and `http://example.com` learn into the same record.
#[inline]
#[must_use]
pub fn extract_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let normalized = if host.len() > 4 && host.starts_with("www.") {
        &host[4..]
    } else {
        host
    };
    Some(normalized.to_lowercase())
}

/// Normalize a URL for use as a cache key
///
/// Drops the fragment (never sent to the server) and any trailing slash on
/// the path so trivially equivalent URLs share a cache entry. Query strings
/// are preserved since they routinely select distinct content.
#[must_use]
pub fn normalize_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            let mut s = parsed.to_string();
            if s.ends_with('/') && parsed.path() != "/" {
                s.pop();
            }
            s
        }
        Err(_) => url.trim().to_string(),
    }
}

/// Check if a URL is fetchable
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    // Skip data URLs, javascript URLs, and other non-http schemes
    if url.starts_with("data:") || url.starts_with("javascript:") || url.starts_with("mailto:") {
        return false;
    }

    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some()
        }
        Err(_) => false,
    }
}
