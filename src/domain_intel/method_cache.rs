//! Per-domain preferred fetch method learning
//!
//! Tracks which retrieval strategy works for each domain as an
//! exponentially weighted success rate. Records are statistical, not
//! transactional: concurrent updates are last-write-wins, and no reader
//! blocks on a writer beyond the map's internal sharding.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::fetch::FetchMethod;

/// Records older than this are treated as cold and re-derived from
/// heuristics
const STALE_AFTER: Duration = Duration::from_secs(86_400);

/// Usage count above which a record's method can be trusted outright
const CONFIDENCE_MIN_USAGE: u32 = 3;

/// Success rate above which a record's method can be trusted outright
const CONFIDENCE_MIN_SUCCESS_RATE: f64 = 0.7;

/// Success-rate penalty applied when the alternate method succeeds
const ALTERNATE_SUCCESS_PENALTY: f64 = 0.7;

/// Success rate below which the preferred method is switched
const SWITCH_THRESHOLD: f64 = 0.5;

/// Success rate a record restarts at after a method switch
const POST_SWITCH_SUCCESS_RATE: f64 = 0.7;

/// Learned state for one domain
#[derive(Debug, Clone)]
pub struct DomainMethodRecord {
    /// Strategy currently believed to work for this domain
    pub preferred_method: FetchMethod,
    /// EMA of attempt success, 0-1
    pub success_rate: f64,
    /// Total observed attempts
    pub usage_count: u32,
    /// Last update, for the 24h cold threshold
    pub last_updated: Instant,
}

impl DomainMethodRecord {
    fn new(method: FetchMethod, success: bool, now: Instant) -> Self {
        Self {
            preferred_method: method,
            success_rate: if success { 1.0 } else { 0.0 },
            usage_count: 1,
            last_updated: now,
        }
    }

    /// High-confidence records skip the cold-start heuristics entirely
    fn is_confident(&self, now: Instant) -> bool {
        self.usage_count > CONFIDENCE_MIN_USAGE
            && self.success_rate > CONFIDENCE_MIN_SUCCESS_RATE
            && now.duration_since(self.last_updated) < STALE_AFTER
    }
}

/// Adaptive EMA weight: early samples dominate, repeated use stabilizes
#[inline]
fn adaptive_alpha(usage_count: u32) -> f64 {
    (2.0 / (f64::from(usage_count) + 5.0)).min(0.3)
}

/// Per-domain method cache
#[derive(Debug, Default)]
pub struct MethodCache {
    records: DashMap<String, DomainMethodRecord>,
}

impl MethodCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Return the learned method for a domain when confidence is high
    /// enough to skip heuristics
    #[must_use]
    pub fn confident_method(&self, domain: &str) -> Option<FetchMethod> {
        self.confident_method_at(domain, Instant::now())
    }

    fn confident_method_at(&self, domain: &str, now: Instant) -> Option<FetchMethod> {
        let record = self.records.get(domain)?;
        if record.is_confident(now) {
            debug!(
                "Using cached method for {}: {} (rate {:.2}, {} uses)",
                domain, record.preferred_method, record.success_rate, record.usage_count
            );
            Some(record.preferred_method)
        } else {
            None
        }
    }

    /// Fold one attempt outcome into the domain's record
    pub fn record_outcome(&self, domain: &str, method: FetchMethod, success: bool) {
        self.record_outcome_at(domain, method, success, Instant::now());
    }

    fn record_outcome_at(&self, domain: &str, method: FetchMethod, success: bool, now: Instant) {
        use dashmap::mapref::entry::Entry;

        match self.records.entry(domain.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(DomainMethodRecord::new(method, success, now));
            }
            Entry::Occupied(mut occupied) => {
                let record = occupied.get_mut();
                record.usage_count += 1;
                let alpha = adaptive_alpha(record.usage_count);

                if record.preferred_method == method {
                    let outcome = if success { 1.0 } else { 0.0 };
                    record.success_rate = (1.0 - alpha) * record.success_rate + alpha * outcome;
                } else if success {
                    // The alternate method just worked: penalize the current
                    // one and switch once its rate falls under the threshold
                    record.success_rate *= ALTERNATE_SUCCESS_PENALTY;

                    if record.success_rate < SWITCH_THRESHOLD {
                        info!(
                            "Switching preferred method for {} from {} to {}",
                            domain, record.preferred_method, method
                        );
                        record.preferred_method = method;
                        record.success_rate = POST_SWITCH_SUCCESS_RATE;
                    }
                }

                record.last_updated = now;
            }
        }
    }

    /// Snapshot of the record for a domain
    #[must_use]
    pub fn get(&self, domain: &str) -> Option<DomainMethodRecord> {
        self.records.get(domain).map(|r| r.value().clone())
    }

    /// Remove every record, returning how many were dropped
    pub fn clear(&self) -> usize {
        let count = self.records.len();
        self.records.clear();
        info!("Domain method cache cleared ({count} entries)");
        count
    }

    /// Per-domain counters for administrative introspection
    #[must_use]
    pub fn stats(&self) -> MethodCacheStats {
        let now = Instant::now();
        let utc_now = Utc::now();

        let domains: Vec<DomainMethodStats> = self
            .records
            .iter()
            .map(|entry| {
                let age = now.duration_since(entry.last_updated);
                DomainMethodStats {
                    domain: entry.key().clone(),
                    method: entry.preferred_method,
                    success_rate: entry.success_rate,
                    usage_count: entry.usage_count,
                    last_updated: utc_now
                        - chrono::Duration::from_std(age).unwrap_or_else(|_| chrono::Duration::zero()),
                }
            })
            .collect();

        let light_count = domains
            .iter()
            .filter(|d| d.method == FetchMethod::Light)
            .count();

        MethodCacheStats {
            total_domains: domains.len(),
            light_method_count: light_count,
            rendered_method_count: domains.len() - light_count,
            domains,
        }
    }
}

/// Aggregate view of the method cache
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCacheStats {
    pub total_domains: usize,
    pub light_method_count: usize,
    pub rendered_method_count: usize,
    pub domains: Vec<DomainMethodStats>,
}

/// One domain's counters
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainMethodStats {
    pub domain: String,
    pub method: FetchMethod,
    pub success_rate: f64,
    pub usage_count: u32,
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_seeds_record() {
        let cache = MethodCache::new();
        cache.record_outcome("example.com", FetchMethod::Light, true);

        let record = cache.get("example.com").expect("record exists");
        assert_eq!(record.preferred_method, FetchMethod::Light);
        assert!((record.success_rate - 1.0).abs() < f64::EPSILON);
        assert_eq!(record.usage_count, 1);
    }

    #[test]
    fn test_confidence_requires_usage_and_rate() {
        let cache = MethodCache::new();
        cache.record_outcome("example.com", FetchMethod::Light, true);
        assert_eq!(cache.confident_method("example.com"), None);

        for _ in 0..4 {
            cache.record_outcome("example.com", FetchMethod::Light, true);
        }
        assert_eq!(
            cache.confident_method("example.com"),
            Some(FetchMethod::Light)
        );
    }

    #[test]
    fn test_alternate_success_penalizes_and_switches() {
        let cache = MethodCache::new();
        for _ in 0..5 {
            cache.record_outcome("spa.example.com", FetchMethod::Light, true);
        }

        // First rendered success penalizes the light rate to 0.7, the
        // second drags it to 0.49 and flips the record
        cache.record_outcome("spa.example.com", FetchMethod::Rendered, true);
        let record = cache.get("spa.example.com").expect("record exists");
        assert_eq!(record.preferred_method, FetchMethod::Light);
        assert!(record.success_rate < 0.75);

        cache.record_outcome("spa.example.com", FetchMethod::Rendered, true);
        let record = cache.get("spa.example.com").expect("record exists");
        assert_eq!(record.preferred_method, FetchMethod::Rendered);
        assert!((record.success_rate - POST_SWITCH_SUCCESS_RATE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_alternate_failure_leaves_rate_alone() {
        let cache = MethodCache::new();
        for _ in 0..5 {
            cache.record_outcome("example.com", FetchMethod::Light, true);
        }
        let before = cache.get("example.com").expect("record").success_rate;

        cache.record_outcome("example.com", FetchMethod::Rendered, false);

        let after = cache.get("example.com").expect("record").success_rate;
        assert!((before - after).abs() < f64::EPSILON);
    }

    #[test]
    fn test_stale_record_loses_confidence() {
        let cache = MethodCache::new();
        let Some(old) = Instant::now().checked_sub(STALE_AFTER + Duration::from_secs(60)) else {
            // Host uptime too short to fabricate an old instant
            return;
        };

        for _ in 0..5 {
            cache.record_outcome_at("example.com", FetchMethod::Light, true, old);
        }
        assert_eq!(cache.confident_method_at("example.com", old), Some(FetchMethod::Light));
        assert_eq!(cache.confident_method("example.com"), None);
    }

    #[test]
    fn test_adaptive_alpha_decays() {
        assert!((adaptive_alpha(1) - 0.3).abs() < f64::EPSILON);
        assert!((adaptive_alpha(5) - 0.2).abs() < f64::EPSILON);
        assert!(adaptive_alpha(100) < 0.02);
    }
}
