//! Tests for per-domain method learning and cold-start routing

use fetchwise::{DomainIntelligence, FetchMethod, ScrapeConfig};

fn intelligence() -> DomainIntelligence {
    DomainIntelligence::new(&ScrapeConfig::default())
}

#[test]
fn test_high_confidence_method_is_sticky() {
    let intel = intelligence();

    // Build usage_count > 3 with a high success rate
    for _ in 0..5 {
        intel.record_outcome("example.com", FetchMethod::Light, true, 1.0);
    }

    // The confident record skips heuristics and exploration entirely, so
    // repeated choices are deterministic
    for _ in 0..50 {
        assert_eq!(intel.choose_method("example.com"), FetchMethod::Light);
    }
}

#[test]
fn test_rendered_preference_is_sticky_too() {
    let intel = intelligence();

    for _ in 0..5 {
        intel.record_outcome("spa.example.com", FetchMethod::Rendered, true, 2.0);
    }

    for _ in 0..50 {
        assert_eq!(intel.choose_method("spa.example.com"), FetchMethod::Rendered);
    }
}

#[test]
fn test_render_required_host_routes_to_rendered() {
    let intel = intelligence();
    assert_eq!(intel.choose_method("medium.com"), FetchMethod::Rendered);
    assert_eq!(
        intel.choose_method("engineering.medium.com"),
        FetchMethod::Rendered
    );
}

#[test]
fn test_js_pattern_host_routes_to_rendered_without_history() {
    let intel = intelligence();

    // An app.-prefixed subdomain goes straight to rendered, never light
    assert_eq!(intel.choose_method("app.widgets.com"), FetchMethod::Rendered);

    // And stays there once outcomes confirm the choice
    for _ in 0..5 {
        intel.record_outcome("app.widgets.com", FetchMethod::Rendered, true, 2.0);
    }
    assert_eq!(intel.choose_method("app.widgets.com"), FetchMethod::Rendered);
}

#[test]
fn test_exploration_rate_on_cold_domains() {
    let intel = intelligence();

    // A plain hostname with no history picks light most of the time but
    // explores rendered at roughly the configured 20% rate
    let trials = 1000;
    let rendered = (0..trials)
        .filter(|_| intel.choose_method("plain-blog.example.org") == FetchMethod::Rendered)
        .count();

    assert!(
        rendered > 100 && rendered < 320,
        "rendered {rendered}/{trials} falls outside plausible exploration bounds"
    );
}

#[test]
fn test_alternate_success_switches_preference() {
    let intel = intelligence();

    for _ in 0..5 {
        intel.record_outcome("flaky.example.com", FetchMethod::Light, true, 1.0);
    }

    // Two rendered successes push the light rate under the switch
    // threshold
    intel.record_outcome("flaky.example.com", FetchMethod::Rendered, true, 2.0);
    intel.record_outcome("flaky.example.com", FetchMethod::Rendered, true, 2.0);

    let record = intel.method_record("flaky.example.com").expect("record exists");
    assert_eq!(record.preferred_method, FetchMethod::Rendered);
}

#[test]
fn test_stats_and_clear() {
    let intel = intelligence();

    intel.record_outcome("a.example.com", FetchMethod::Light, true, 1.0);
    intel.record_outcome("b.example.com", FetchMethod::Rendered, true, 2.0);

    let stats = intel.method_cache_stats();
    assert_eq!(stats.total_domains, 2);
    assert_eq!(stats.light_method_count, 1);
    assert_eq!(stats.rendered_method_count, 1);
    assert_eq!(stats.domains.len(), 2);

    let serialized = serde_json::to_value(&stats).expect("stats serialize");
    assert!(serialized.get("totalDomains").is_some());
    assert!(serialized["domains"][0].get("successRate").is_some());

    assert_eq!(intel.clear_method_cache(), 2);
    assert_eq!(intel.method_cache_stats().total_domains, 0);
}
