//! Adaptive acquisition orchestration
//!
//! Ties the pieces together: static fast-fail, per-domain method choice,
//! per-call timeout budget, light-to-rendered fallback, and outcome
//! feedback into the learning caches.
//!
//! Every strategy invocation is wrapped in an explicit external deadline;
//! a strategy's own internal timeout is never trusted to prevent a hang.
//! A timed-out sub-call is an ordinary failure: the engine returns None,
//! it never raises past its boundary.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::browser_pool::BrowserPool;
use crate::config::ScrapeConfig;
use crate::domain_intel::{self, DomainIntelligence};
use crate::fetch::{
    FetchFailure, FetchMethod, FetchResult, FetchStrategy, LightFetch, RenderedFetch,
};
use crate::utils::constants::{FALLBACK_MIN_REMAINING_SECS, LIGHT_FETCH_CAP_SECS};
use crate::utils::url_utils::extract_domain;

/// Slack added to the external deadline of a light fetch, covering
/// client setup around the strategy's own cap
const LIGHT_DEADLINE_GRACE: Duration = Duration::from_secs(1);

/// Slack added to the external deadline of a rendered fetch
///
/// Pool acquisition under contention legitimately waits up to the forced
/// eviction window before the overflow valve opens; the external deadline
/// must sit beyond that or the valve could never fire. The fetch is still
/// bounded, just not by the nominal per-domain budget alone.
const RENDERED_DEADLINE_GRACE: Duration = Duration::from_secs(35);

/// Adaptive content-acquisition engine
///
/// Owns the process-wide learning state and the strategy pair. Public
/// entry points return `Option`; no per-request failure escapes as an
/// error.
pub struct AcquisitionEngine {
    intelligence: Arc<DomainIntelligence>,
    light: Arc<dyn FetchStrategy>,
    rendered: Arc<dyn FetchStrategy>,
    min_timeout: Duration,
}

impl AcquisitionEngine {
    /// Build the production engine over a browser pool
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ScrapeConfig, pool: Arc<BrowserPool>) -> anyhow::Result<Self> {
        Ok(Self {
            intelligence: Arc::new(DomainIntelligence::new(config)),
            light: Arc::new(LightFetch::new()?),
            rendered: Arc::new(RenderedFetch::new(pool)),
            min_timeout: Duration::from_secs_f64(config.min_timeout_secs()),
        })
    }

    /// Build an engine over arbitrary strategies (tests inject stubs here)
    #[must_use]
    pub fn with_strategies(
        intelligence: Arc<DomainIntelligence>,
        light: Arc<dyn FetchStrategy>,
        rendered: Arc<dyn FetchStrategy>,
        min_timeout: Duration,
    ) -> Self {
        Self {
            intelligence,
            light,
            rendered,
            min_timeout,
        }
    }

    /// The learning state backing this engine
    #[must_use]
    pub fn intelligence(&self) -> &Arc<DomainIntelligence> {
        &self.intelligence
    }

    /// Per-domain method cache counters
    #[must_use]
    pub fn domain_method_cache_stats(&self) -> crate::domain_intel::MethodCacheStats {
        self.intelligence.method_cache_stats()
    }

    /// Drop all learned method records, returning the count removed
    pub fn clear_domain_method_cache(&self) -> usize {
        self.intelligence.clear_method_cache()
    }

    /// Per-domain timeout cache counters
    #[must_use]
    pub fn domain_timeout_cache_stats(&self) -> crate::domain_intel::TimeoutCacheStats {
        self.intelligence.timeout_cache_stats()
    }

    /// Drop all learned timeout records, returning the count removed
    pub fn clear_domain_timeout_cache(&self) -> usize {
        self.intelligence.clear_timeout_cache()
    }

    /// Fetch a page with the cheapest strategy expected to work
    ///
    /// Returns None for unscrapable hosts (with zero strategy
    /// invocations), invalid URLs, and attempts where every strategy
    /// within budget failed. The measured wall-clock elapsed time is fed
    /// back into timeout learning regardless of which branch ran.
    pub async fn fetch(&self, url: &str, timeout_hint: Option<Duration>) -> Option<FetchResult> {
        let Some(domain) = extract_domain(url) else {
            warn!("Cannot fetch invalid URL: {url}");
            return None;
        };

        // Fast-fail policy, not a learned one: zero strategy invocations
        if domain_intel::is_unscrapable(&domain) {
            debug!("Skipping unscrapable host: {domain}");
            return None;
        }

        let nominal = timeout_hint
            .unwrap_or_else(|| Duration::from_secs_f64(self.intelligence.timeout_for(&domain)));
        let effective = nominal.max(self.min_timeout);

        let method = self.intelligence.choose_method(&domain);
        let start = Instant::now();

        let (final_method, outcome) = match method {
            FetchMethod::Light => self.fetch_light_with_fallback(url, effective, start).await,
            FetchMethod::Rendered => {
                let outcome = self
                    .bounded(&self.rendered, url, effective, RENDERED_DEADLINE_GRACE)
                    .await;
                (FetchMethod::Rendered, outcome)
            }
        };

        let elapsed = start.elapsed().as_secs_f64();
        match outcome {
            Ok(result) => {
                self.intelligence
                    .record_outcome(&domain, final_method, true, elapsed);
                debug!(
                    "Fetched {url} via {final_method} in {elapsed:.2}s"
                );
                Some(result)
            }
            Err(failure) => {
                self.intelligence
                    .record_outcome(&domain, final_method, false, elapsed);
                info!("Failed to fetch {url} via {final_method}: {failure}");
                None
            }
        }
    }

    /// Light attempt, then rendered when enough budget remains
    ///
    /// The recorded outcome belongs to whichever attempt produced the
    /// final result: a light failure that falls back reports the rendered
    /// attempt's method and outcome.
    async fn fetch_light_with_fallback(
        &self,
        url: &str,
        effective: Duration,
        start: Instant,
    ) -> (FetchMethod, Result<FetchResult, FetchFailure>) {
        // A light attempt never gets more than its cap, so a hang there
        // cannot eat the budget the fallback needs
        let light_budget = effective.min(Duration::from_secs_f64(LIGHT_FETCH_CAP_SECS));
        let light_outcome = self
            .bounded(&self.light, url, light_budget, LIGHT_DEADLINE_GRACE)
            .await;

        match light_outcome {
            Ok(result) => (FetchMethod::Light, Ok(result)),
            Err(failure) => {
                let remaining = effective.saturating_sub(start.elapsed());
                if remaining > Duration::from_secs_f64(FALLBACK_MIN_REMAINING_SECS) {
                    debug!("Light fetch failed for {url} ({failure}), trying rendered");
                    let outcome = self
                        .bounded(&self.rendered, url, remaining, RENDERED_DEADLINE_GRACE)
                        .await;
                    (FetchMethod::Rendered, outcome)
                } else {
                    debug!(
                        "Light fetch failed for {url} with only {remaining:?} left, no fallback"
                    );
                    (FetchMethod::Light, Err(failure))
                }
            }
        }
    }

    /// Run a strategy under an explicit external deadline
    ///
    /// The deadline is the strategy's budget plus a small grace, so a
    /// strategy that honors its own budget is never cut short while a
    /// hung one cannot exceed the computed bound.
    async fn bounded(
        &self,
        strategy: &Arc<dyn FetchStrategy>,
        url: &str,
        budget: Duration,
        grace: Duration,
    ) -> Result<FetchResult, FetchFailure> {
        match tokio::time::timeout(budget + grace, strategy.fetch(url, budget)).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "{} fetch exceeded external deadline for {url}",
                    strategy.method()
                );
                Err(FetchFailure::DeadlineExceeded(
                    (budget + grace).as_secs_f64(),
                ))
            }
        }
    }
}
