//! Per-domain adaptive timeout learning
//!
//! Each domain's timeout budget tracks its observed latency: successes
//! shrink the budget toward a multiple of the latency average, failures
//! grow it. The budget is clamped to the configured bounds at every
//! update, so no sequence of outcomes can push it out of range.
//!
//! Like the method cache, records are statistical and tolerate
//! last-write-wins races.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Elapsed samples outside this window are measurement noise (connection
/// reuse artifacts, stuck sockets) and never enter the latency average
const MIN_VALID_ELAPSED_SECS: f64 = 0.1;
const MAX_VALID_ELAPSED_SECS: f64 = 60.0;

/// Failure growth factors: ordinary, and after 24h without a success
const GROWTH_FACTOR: f64 = 1.2;
const GROWTH_FACTOR_COLD: f64 = 1.5;

/// How long without a success before the aggressive growth factor applies
const COLD_SUCCESS_AGE: Duration = Duration::from_secs(86_400);

/// Learned timeout state for one domain
#[derive(Debug, Clone)]
pub struct DomainTimeoutRecord {
    /// Current timeout budget in seconds, always within configured bounds
    pub timeout_secs: f64,
    /// EMA of attempt success, 0-1
    pub success_rate: f64,
    /// EMA of observed latency for successful attempts, seconds
    pub avg_latency_secs: f64,
    /// Total observed attempts
    pub usage_count: u32,
    /// Last update
    pub last_updated: Instant,
    /// Last successful attempt, for the cold growth factor
    pub last_success: Option<Instant>,
}

/// Shrink multiplier by success-rate tier: reliable domains get a tight
/// budget over their observed latency, flaky ones keep more headroom
#[inline]
fn shrink_multiplier(success_rate: f64) -> f64 {
    if success_rate > 0.9 {
        1.3
    } else if success_rate > 0.8 {
        1.5
    } else if success_rate > 0.5 {
        1.7
    } else {
        2.0
    }
}

#[inline]
fn adaptive_alpha(usage_count: u32) -> f64 {
    (2.0 / (f64::from(usage_count) + 5.0)).min(0.3)
}

/// Per-domain adaptive timeout cache
#[derive(Debug)]
pub struct TimeoutCache {
    records: DashMap<String, DomainTimeoutRecord>,
    default_timeout_secs: f64,
    min_timeout_secs: f64,
    max_timeout_secs: f64,
}

impl TimeoutCache {
    #[must_use]
    pub fn new(default_timeout_secs: f64, min_timeout_secs: f64, max_timeout_secs: f64) -> Self {
        Self {
            records: DashMap::new(),
            default_timeout_secs,
            min_timeout_secs,
            max_timeout_secs,
        }
    }

    #[inline]
    fn clamp(&self, timeout_secs: f64) -> f64 {
        timeout_secs.clamp(self.min_timeout_secs, self.max_timeout_secs)
    }

    /// Current timeout budget for a domain, in seconds
    #[must_use]
    pub fn timeout_for(&self, domain: &str) -> f64 {
        self.records
            .get(domain)
            .map_or(self.default_timeout_secs, |r| r.timeout_secs)
    }

    /// Fold one attempt outcome into the domain's timeout record
    ///
    /// `elapsed_secs` is the measured wall-clock duration of the whole
    /// attempt regardless of which strategy branch ran.
    pub fn record_outcome(&self, domain: &str, success: bool, elapsed_secs: f64) {
        self.record_outcome_at(domain, success, elapsed_secs, Instant::now());
    }

    fn record_outcome_at(&self, domain: &str, success: bool, elapsed_secs: f64, now: Instant) {
        use dashmap::mapref::entry::Entry;

        let valid_sample =
            (MIN_VALID_ELAPSED_SECS..=MAX_VALID_ELAPSED_SECS).contains(&elapsed_secs);

        match self.records.entry(domain.to_string()) {
            Entry::Vacant(vacant) => {
                let mut record = DomainTimeoutRecord {
                    timeout_secs: self.default_timeout_secs,
                    success_rate: if success { 1.0 } else { 0.0 },
                    avg_latency_secs: 0.0,
                    usage_count: 1,
                    last_updated: now,
                    last_success: success.then_some(now),
                };

                if success && valid_sample {
                    record.avg_latency_secs = elapsed_secs;
                    record.timeout_secs =
                        self.clamp(elapsed_secs * shrink_multiplier(record.success_rate));
                } else if !success {
                    record.timeout_secs = self.clamp(self.default_timeout_secs * GROWTH_FACTOR);
                }

                vacant.insert(record);
            }
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                record.usage_count += 1;
                let alpha = adaptive_alpha(record.usage_count);
                let outcome = if success { 1.0 } else { 0.0 };
                record.success_rate = (1.0 - alpha) * record.success_rate + alpha * outcome;

                if success {
                    record.last_success = Some(now);

                    if valid_sample {
                        record.avg_latency_secs = if record.avg_latency_secs > 0.0 {
                            (1.0 - alpha) * record.avg_latency_secs + alpha * elapsed_secs
                        } else {
                            elapsed_secs
                        };

                        let target =
                            record.avg_latency_secs * shrink_multiplier(record.success_rate);
                        record.timeout_secs = self.clamp(target);
                        debug!(
                            "Timeout for {} adapted to {:.1}s (avg latency {:.2}s, rate {:.2})",
                            domain, record.timeout_secs, record.avg_latency_secs, record.success_rate
                        );
                    }
                } else {
                    let cold = record
                        .last_success
                        .is_none_or(|t| now.duration_since(t) > COLD_SUCCESS_AGE);
                    let factor = if cold { GROWTH_FACTOR_COLD } else { GROWTH_FACTOR };
                    record.timeout_secs = self.clamp(record.timeout_secs * factor);
                    debug!(
                        "Timeout for {} grown to {:.1}s after failure (cold: {})",
                        domain, record.timeout_secs, cold
                    );
                }

                record.last_updated = now;
            }
        }
    }

    /// Snapshot of the record for a domain
    #[must_use]
    pub fn get(&self, domain: &str) -> Option<DomainTimeoutRecord> {
        self.records.get(domain).map(|r| r.value().clone())
    }

    /// Remove every record, returning how many were dropped
    pub fn clear(&self) -> usize {
        let count = self.records.len();
        self.records.clear();
        info!("Domain timeout cache cleared ({count} entries)");
        count
    }

    /// Per-domain counters for administrative introspection
    #[must_use]
    pub fn stats(&self) -> TimeoutCacheStats {
        let now = Instant::now();
        let utc_now = Utc::now();

        let domains: Vec<DomainTimeoutStats> = self
            .records
            .iter()
            .map(|entry| {
                let age = now.duration_since(entry.last_updated);
                DomainTimeoutStats {
                    domain: entry.key().clone(),
                    timeout_seconds: entry.timeout_secs,
                    success_rate: entry.success_rate,
                    avg_latency_seconds: entry.avg_latency_secs,
                    usage_count: entry.usage_count,
                    last_updated: utc_now
                        - chrono::Duration::from_std(age).unwrap_or_else(|_| chrono::Duration::zero()),
                }
            })
            .collect();

        TimeoutCacheStats {
            total_domains: domains.len(),
            domains,
        }
    }
}

/// Aggregate view of the timeout cache
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeoutCacheStats {
    pub total_domains: usize,
    pub domains: Vec<DomainTimeoutStats>,
}

/// One domain's timeout counters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainTimeoutStats {
    pub domain: String,
    pub timeout_seconds: f64,
    pub success_rate: f64,
    pub avg_latency_seconds: f64,
    pub usage_count: u32,
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> TimeoutCache {
        TimeoutCache::new(8.0, 3.0, 30.0)
    }

    #[test]
    fn test_unknown_domain_gets_default() {
        assert!((cache().timeout_for("example.com") - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_success_shrinks_toward_latency() {
        let c = cache();
        for _ in 0..10 {
            c.record_outcome("fast.example.com", true, 2.0);
        }
        let record = c.get("fast.example.com").expect("record");
        // Pure successes: rate ~1.0, so budget converges on 1.3x latency,
        // clamped at the 3s floor
        assert!((record.avg_latency_secs - 2.0).abs() < 0.01);
        assert!(record.timeout_secs >= 3.0);
        assert!(record.timeout_secs <= 2.0 * 2.0);
        assert!(record.timeout_secs >= record.avg_latency_secs);
    }

    #[test]
    fn test_failures_grow_monotonically_to_max() {
        let c = cache();
        let mut last = c.timeout_for("down.example.com");
        for _ in 0..20 {
            c.record_outcome("down.example.com", false, 8.0);
            let current = c.timeout_for("down.example.com");
            assert!(current >= last);
            assert!(current <= 30.0);
            last = current;
        }
        assert!((last - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_outlier_elapsed_does_not_move_average() {
        let c = cache();
        c.record_outcome("example.com", true, 2.0);
        let before = c.get("example.com").expect("record").avg_latency_secs;

        c.record_outcome("example.com", true, 0.05);
        c.record_outcome("example.com", true, 120.0);

        let after = c.get("example.com").expect("record");
        assert!((after.avg_latency_secs - before).abs() < f64::EPSILON);
        // The attempts still count
        assert_eq!(after.usage_count, 3);
    }

    #[test]
    fn test_cold_domain_grows_faster() {
        let c = cache();
        let Some(old) = Instant::now().checked_sub(COLD_SUCCESS_AGE + Duration::from_secs(60))
        else {
            return;
        };

        // Domain A succeeded recently, domain B a long time ago
        c.record_outcome_at("warm.example.com", true, 5.0, Instant::now());
        c.record_outcome_at("cold.example.com", true, 5.0, old);

        let warm_before = c.timeout_for("warm.example.com");
        let cold_before = c.timeout_for("cold.example.com");
        c.record_outcome("warm.example.com", false, 8.0);
        c.record_outcome("cold.example.com", false, 8.0);

        let warm_growth = c.timeout_for("warm.example.com") / warm_before;
        let cold_growth = c.timeout_for("cold.example.com") / cold_before;
        assert!((warm_growth - GROWTH_FACTOR).abs() < 0.01);
        assert!((cold_growth - GROWTH_FACTOR_COLD).abs() < 0.01);
    }

    #[test]
    fn test_shrink_multiplier_tiers() {
        assert!((shrink_multiplier(0.95) - 1.3).abs() < f64::EPSILON);
        assert!((shrink_multiplier(0.85) - 1.5).abs() < f64::EPSILON);
        assert!((shrink_multiplier(0.6) - 1.7).abs() < f64::EPSILON);
        assert!((shrink_multiplier(0.3) - 2.0).abs() < f64::EPSILON);
    }
}
