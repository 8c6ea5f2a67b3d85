//! Tests for per-domain adaptive timeout learning

use fetchwise::domain_intel::TimeoutCache;
use proptest::prelude::*;

const DEFAULT: f64 = 8.0;
const MIN: f64 = 3.0;
const MAX: f64 = 30.0;

fn cache() -> TimeoutCache {
    TimeoutCache::new(DEFAULT, MIN, MAX)
}

#[test]
fn test_default_until_first_observation() {
    let c = cache();
    assert!((c.timeout_for("example.com") - DEFAULT).abs() < f64::EPSILON);
}

#[test]
fn test_pure_successes_trend_toward_latency() {
    let c = cache();
    for _ in 0..20 {
        c.record_outcome("steady.example.com", true, 4.0);
    }

    let record = c.get("steady.example.com").expect("record exists");
    // Converged average, budget above it but well under the default x2
    assert!((record.avg_latency_secs - 4.0).abs() < 0.05);
    assert!(record.timeout_secs >= record.avg_latency_secs);
    assert!(record.timeout_secs <= 4.0 * 2.0);
}

#[test]
fn test_pure_failures_grow_to_max() {
    let c = cache();
    let mut previous = c.timeout_for("down.example.com");
    for _ in 0..25 {
        c.record_outcome("down.example.com", false, DEFAULT);
        let current = c.timeout_for("down.example.com");
        assert!(current >= previous, "growth must be monotone");
        previous = current;
    }
    assert!((previous - MAX).abs() < f64::EPSILON);
}

#[test]
fn test_recovery_after_failures() {
    let c = cache();
    for _ in 0..10 {
        c.record_outcome("flappy.example.com", false, DEFAULT);
    }
    let grown = c.timeout_for("flappy.example.com");
    assert!(grown > DEFAULT);

    for _ in 0..20 {
        c.record_outcome("flappy.example.com", true, 2.0);
    }
    let recovered = c.timeout_for("flappy.example.com");
    assert!(recovered < grown);
    assert!(recovered >= MIN);
}

#[test]
fn test_outliers_do_not_update_latency() {
    let c = cache();
    c.record_outcome("example.com", true, 5.0);
    let baseline = c.get("example.com").expect("record").avg_latency_secs;

    c.record_outcome("example.com", true, 0.01);
    c.record_outcome("example.com", true, 300.0);

    let record = c.get("example.com").expect("record");
    assert!((record.avg_latency_secs - baseline).abs() < f64::EPSILON);
}

#[test]
fn test_stats_and_clear() {
    let c = cache();
    c.record_outcome("a.example.com", true, 2.0);
    c.record_outcome("b.example.com", false, 8.0);

    let stats = c.stats();
    assert_eq!(stats.total_domains, 2);

    let serialized = serde_json::to_value(&stats).expect("stats serialize");
    assert!(serialized.get("totalDomains").is_some());
    assert!(serialized["domains"][0].get("timeoutSeconds").is_some());

    assert_eq!(c.clear(), 2);
    assert_eq!(c.stats().total_domains, 0);
}

proptest! {
    /// For any sequence of outcomes and elapsed samples, the learned
    /// timeout never leaves the configured bounds.
    #[test]
    fn prop_timeout_stays_within_bounds(
        outcomes in prop::collection::vec((any::<bool>(), 0.0f64..90.0), 1..200)
    ) {
        let c = cache();
        for (success, elapsed) in outcomes {
            c.record_outcome("fuzz.example.com", success, elapsed);
            let timeout = c.timeout_for("fuzz.example.com");
            prop_assert!(timeout >= MIN - f64::EPSILON);
            prop_assert!(timeout <= MAX + f64::EPSILON);
        }
    }
}
