//! Static host lists and hostname pattern rules
//!
//! Cold-start routing signals checked before any learned state exists:
//! hosts that can never be scraped, hosts guaranteed to need rendering,
//! and hostname shapes that usually indicate a script-driven frontend.

/// Hosts where fetching is pointless: auth walls, social networks, and
/// known CAPTCHA surfaces. Requests to these fast-fail with no strategy
/// invocation.
pub const UNSCRAPABLE_HOSTS: &[&str] = &[
    "facebook.com",
    "instagram.com",
    "twitter.com",
    "x.com",
    "linkedin.com",
    "pinterest.com",
    "tiktok.com",
    "quora.com",
    "glassdoor.com",
    "chegg.com",
    "coursehero.com",
];

/// Hosts known to serve an empty shell without script execution.
/// Routed straight to rendered fetching, skipping the light attempt.
pub const RENDER_REQUIRED_HOSTS: &[&str] = &[
    "medium.com",
    "stackoverflow.com",
    "substack.com",
    "notion.site",
    "codepen.io",
    "codesandbox.io",
];

/// Subdomain prefixes that usually front single-page applications
const JS_SUBDOMAIN_PREFIXES: &[&str] = &["app.", "play.", "studio.", "dashboard.", "console."];

/// Host suffixes of SPA hosting platforms and app-like TLDs
const APP_HOST_SUFFIXES: &[&str] = &[
    ".vercel.app",
    ".netlify.app",
    ".web.app",
    ".pages.dev",
    ".app",
];

/// Framework names that show up in hostnames of script-driven sites
const FRAMEWORK_SUBSTRINGS: &[&str] = &["react", "angular", "nextjs", "nuxt", "svelte"];

/// True if the host matches `candidate` exactly or as a subdomain
#[inline]
fn host_matches(domain: &str, candidate: &str) -> bool {
    domain == candidate || domain.ends_with(&format!(".{candidate}"))
}

/// Check the unscrapable fast-fail list
#[must_use]
pub fn is_unscrapable(domain: &str) -> bool {
    UNSCRAPABLE_HOSTS.iter().any(|h| host_matches(domain, h))
}

/// Check the guaranteed-rendering host list
#[must_use]
pub fn requires_rendering(domain: &str) -> bool {
    RENDER_REQUIRED_HOSTS.iter().any(|h| host_matches(domain, h))
}

/// Hostname-shape heuristics suggesting a script-driven frontend
///
/// These catch requirements the static lists miss: `app.`-style
/// subdomains, SPA hosting platforms, and framework names embedded in
/// the hostname.
#[must_use]
pub fn matches_js_patterns(domain: &str) -> bool {
    if JS_SUBDOMAIN_PREFIXES.iter().any(|p| domain.starts_with(p)) {
        return true;
    }
    if APP_HOST_SUFFIXES.iter().any(|s| domain.ends_with(s)) {
        return true;
    }
    FRAMEWORK_SUBSTRINGS.iter().any(|f| domain.contains(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscrapable_hosts() {
        assert!(is_unscrapable("facebook.com"));
        assert!(is_unscrapable("m.facebook.com"));
        assert!(is_unscrapable("x.com"));
        assert!(!is_unscrapable("example.com"));
        // Suffix matching must not catch lookalike registrations
        assert!(!is_unscrapable("notfacebook.com"));
    }

    #[test]
    fn test_render_required_hosts() {
        assert!(requires_rendering("medium.com"));
        assert!(requires_rendering("engineering.medium.com"));
        assert!(!requires_rendering("example.com"));
    }

    #[test]
    fn test_js_patterns() {
        assert!(matches_js_patterns("app.example.com"));
        assert!(matches_js_patterns("dashboard.widgets.io"));
        assert!(matches_js_patterns("myproject.vercel.app"));
        assert!(matches_js_patterns("reactrouter.com"));
        assert!(!matches_js_patterns("example.com"));
        assert!(!matches_js_patterns("blog.example.org"));
    }
}
