//! Configuration for adaptive content acquisition
//!
//! This module contains the main `ScrapeConfig` struct defining timeout
//! bounds, browser pool sizing, and optional rendering-engine settings.

mod builder;

pub use builder::ScrapeConfigBuilder;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::utils::constants::{
    DEFAULT_CACHE_TTL_SECS, DEFAULT_MAX_IDLE_SECS, DEFAULT_MAX_INSTANCES, DEFAULT_TIMEOUT_SECS,
    MAX_TIMEOUT_SECS, MIN_TIMEOUT_SECS,
};

/// Main configuration struct for content acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Default per-fetch timeout in seconds, used when a domain has no
    /// learned timeout yet.
    pub(crate) default_timeout_secs: f64,

    /// Floor for learned and hinted timeouts.
    ///
    /// **INVARIANT:** `min_timeout_secs <= default_timeout_secs <= max_timeout_secs`
    /// (validated in the builder).
    pub(crate) min_timeout_secs: f64,

    /// Ceiling for learned timeouts.
    pub(crate) max_timeout_secs: f64,

    /// Maximum pooled browser instances.
    ///
    /// The pool may deliberately exceed this under sustained contention
    /// (logged overflow); see `browser_pool`.
    pub(crate) max_instances: usize,

    /// Close pooled browsers idle longer than this many seconds.
    pub(crate) max_idle_secs: u64,

    /// Apply anti-detection instrumentation to pooled browsers.
    ///
    /// Decided once at startup; if instrumentation errors at runtime it is
    /// disabled for the remainder of the process lifetime.
    pub(crate) stealth_mode: bool,

    /// Explicit rendering-engine executable path.
    ///
    /// When unset, well-known install locations are searched and, if
    /// `download_on_demand` is set, a managed build is downloaded.
    pub(crate) executable_path: Option<PathBuf>,

    /// Download a managed browser build when no local install is found.
    pub(crate) download_on_demand: bool,

    /// TTL in seconds for cached pages and extracted resources.
    pub(crate) cache_ttl_secs: u64,

    /// Run browsers in headless mode.
    pub(crate) headless: bool,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: DEFAULT_TIMEOUT_SECS,
            min_timeout_secs: MIN_TIMEOUT_SECS,
            max_timeout_secs: MAX_TIMEOUT_SECS,
            max_instances: DEFAULT_MAX_INSTANCES,
            max_idle_secs: DEFAULT_MAX_IDLE_SECS,
            stealth_mode: true,
            executable_path: None,
            download_on_demand: false,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            headless: true,
        }
    }
}

impl ScrapeConfig {
    /// Create a builder for constructing a validated config
    #[must_use]
    pub fn builder() -> ScrapeConfigBuilder {
        ScrapeConfigBuilder::default()
    }

    #[must_use]
    pub fn default_timeout_secs(&self) -> f64 {
        self.default_timeout_secs
    }

    #[must_use]
    pub fn min_timeout_secs(&self) -> f64 {
        self.min_timeout_secs
    }

    #[must_use]
    pub fn max_timeout_secs(&self) -> f64 {
        self.max_timeout_secs
    }

    #[must_use]
    pub fn max_instances(&self) -> usize {
        self.max_instances
    }

    #[must_use]
    pub fn max_idle_secs(&self) -> u64 {
        self.max_idle_secs
    }

    #[must_use]
    pub fn stealth_mode(&self) -> bool {
        self.stealth_mode
    }

    #[must_use]
    pub fn executable_path(&self) -> Option<&PathBuf> {
        self.executable_path.as_ref()
    }

    #[must_use]
    pub fn download_on_demand(&self) -> bool {
        self.download_on_demand
    }

    #[must_use]
    pub fn cache_ttl_secs(&self) -> u64 {
        self.cache_ttl_secs
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }
}
