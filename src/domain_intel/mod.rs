//! Per-domain learned intelligence
//!
//! Two caches learned from fetch outcomes: which strategy works for a
//! domain ([`method_cache`]) and how long to wait for it
//! ([`timeout_cache`]), plus the static cold-start rules
//! ([`heuristics`]) consulted before any history exists.
//!
//! Neither cache takes a lock around reads and writes beyond the map's
//! internal sharding; concurrent updates are last-write-wins, accepted
//! because the records are statistical, not transactional.

pub mod heuristics;
pub mod method_cache;
pub mod timeout_cache;

pub use heuristics::{is_unscrapable, matches_js_patterns, requires_rendering};
pub use method_cache::{DomainMethodRecord, DomainMethodStats, MethodCache, MethodCacheStats};
pub use timeout_cache::{
    DomainTimeoutRecord, DomainTimeoutStats, TimeoutCache, TimeoutCacheStats,
};

use rand::Rng;
use tracing::debug;

use crate::config::ScrapeConfig;
use crate::fetch::FetchMethod;

/// Probability of trying a rendered fetch on a domain with no history,
/// to discover rendering requirements the static rules miss
const EXPLORATION_CHANCE: f64 = 0.2;

/// Learned per-domain state: preferred method and adaptive timeout
///
/// Injectable rather than module-global so tests and embedders control
/// its lifetime; the engine owns one instance per process.
#[derive(Debug)]
pub struct DomainIntelligence {
    methods: MethodCache,
    timeouts: TimeoutCache,
}

impl DomainIntelligence {
    #[must_use]
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            methods: MethodCache::new(),
            timeouts: TimeoutCache::new(
                config.default_timeout_secs(),
                config.min_timeout_secs(),
                config.max_timeout_secs(),
            ),
        }
    }

    /// Choose the fetch strategy for a domain
    ///
    /// Resolution order: hosts guaranteed to need rendering, then a
    /// high-confidence learned record, then hostname-shape heuristics,
    /// then light with a small exploration chance of rendered.
    #[must_use]
    pub fn choose_method(&self, domain: &str) -> FetchMethod {
        if heuristics::requires_rendering(domain) {
            debug!("{domain} is on the render-required list");
            return FetchMethod::Rendered;
        }

        if let Some(method) = self.methods.confident_method(domain) {
            return method;
        }

        if heuristics::matches_js_patterns(domain) {
            debug!("{domain} matches a JS hostname pattern, rendering");
            return FetchMethod::Rendered;
        }

        if rand::rng().random_bool(EXPLORATION_CHANCE) {
            debug!("Exploring rendered fetch for {domain}");
            return FetchMethod::Rendered;
        }

        FetchMethod::Light
    }

    /// Feed one attempt outcome into both caches
    ///
    /// `elapsed_secs` is the wall-clock duration of the whole attempt,
    /// including any fallback, and drives timeout learning regardless of
    /// which branch produced the result.
    pub fn record_outcome(
        &self,
        domain: &str,
        method: FetchMethod,
        success: bool,
        elapsed_secs: f64,
    ) {
        self.methods.record_outcome(domain, method, success);
        self.timeouts.record_outcome(domain, success, elapsed_secs);
    }

    /// Current timeout budget for a domain, in seconds
    #[must_use]
    pub fn timeout_for(&self, domain: &str) -> f64 {
        self.timeouts.timeout_for(domain)
    }

    /// Snapshot of a domain's method record
    #[must_use]
    pub fn method_record(&self, domain: &str) -> Option<DomainMethodRecord> {
        self.methods.get(domain)
    }

    /// Snapshot of a domain's timeout record
    #[must_use]
    pub fn timeout_record(&self, domain: &str) -> Option<DomainTimeoutRecord> {
        self.timeouts.get(domain)
    }

    /// Administrative introspection over the method cache
    #[must_use]
    pub fn method_cache_stats(&self) -> MethodCacheStats {
        self.methods.stats()
    }

    /// Drop all method records, returning the count removed
    pub fn clear_method_cache(&self) -> usize {
        self.methods.clear()
    }

    /// Administrative introspection over the timeout cache
    #[must_use]
    pub fn timeout_cache_stats(&self) -> TimeoutCacheStats {
        self.timeouts.stats()
    }

    /// Drop all timeout records, returning the count removed
    pub fn clear_timeout_cache(&self) -> usize {
        self.timeouts.clear()
    }
}
