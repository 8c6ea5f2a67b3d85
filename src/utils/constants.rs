//! Shared configuration constants for fetchwise
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default per-fetch timeout: 8 seconds
///
/// Starting budget for a domain with no learned timeout history.
/// The adaptive timeout cache moves each domain away from this value
/// as latency evidence accumulates.
pub const DEFAULT_TIMEOUT_SECS: f64 = 8.0;

/// Floor for any learned or hinted timeout: 3 seconds
///
/// Below this, slow-but-healthy servers get misclassified as failing and
/// the timeout cache has no successful latency samples left to recover from.
pub const MIN_TIMEOUT_SECS: f64 = 3.0;

/// Ceiling for any learned timeout: 30 seconds
///
/// Matches the rendered-fetch navigation budget. Repeated failures grow a
/// domain's timeout toward this value but never past it.
pub const MAX_TIMEOUT_SECS: f64 = 30.0;

/// Hard cap on a light (plain HTTP) fetch: 4 seconds
///
/// A light fetch that takes longer than this is a strong signal the site
/// needs rendering anyway; capping it preserves budget for the fallback.
pub const LIGHT_FETCH_CAP_SECS: f64 = 4.0;

/// Minimum remaining budget worth spending on a rendered fallback: 3 seconds
///
/// Browser navigation under 3 seconds almost never completes, so a fallback
/// with less budget than this is skipped rather than wasted.
pub const FALLBACK_MIN_REMAINING_SECS: f64 = 3.0;

/// Default maximum pooled browser instances
pub const DEFAULT_MAX_INSTANCES: usize = 3;

/// Default maximum browser idle time before cleanup: 5 minutes
pub const DEFAULT_MAX_IDLE_SECS: u64 = 300;

/// Default TTL for cached pages and extracted resources: 1 week
pub const DEFAULT_CACHE_TTL_SECS: u64 = 604_800;

/// User agents rotated across light fetches
///
/// Rotation avoids a trivially fingerprintable request stream when many
/// fetches hit the same origin. Rendered fetches use the browser's own
/// user agent instead.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.205 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:134.0) Gecko/20100101 Firefox/134.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.110 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.6778.139 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36 Edg/132.0.2957.115",
];

/// Chrome user agent string passed at browser launch
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
/// Next update: 2025-04-29 (quarterly schedule)
///
/// Reference: https://chromiumdash.appspot.com/schedule
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
