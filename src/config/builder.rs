//! Builder for `ScrapeConfig` with validation of timeout bounds

use std::path::PathBuf;

use super::ScrapeConfig;

/// Builder for [`ScrapeConfig`]
///
/// All fields are optional; unset fields take the defaults from
/// `ScrapeConfig::default()`. `build()` validates the timeout ordering
/// invariant so an inverted range can never reach the timeout cache.
#[derive(Debug, Default, Clone)]
pub struct ScrapeConfigBuilder {
    default_timeout_secs: Option<f64>,
    min_timeout_secs: Option<f64>,
    max_timeout_secs: Option<f64>,
    max_instances: Option<usize>,
    max_idle_secs: Option<u64>,
    stealth_mode: Option<bool>,
    executable_path: Option<PathBuf>,
    download_on_demand: Option<bool>,
    cache_ttl_secs: Option<u64>,
    headless: Option<bool>,
}

impl ScrapeConfigBuilder {
    #[must_use]
    pub fn default_timeout_secs(mut self, secs: f64) -> Self {
        self.default_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn min_timeout_secs(mut self, secs: f64) -> Self {
        self.min_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn max_timeout_secs(mut self, secs: f64) -> Self {
        self.max_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn max_instances(mut self, count: usize) -> Self {
        self.max_instances = Some(count);
        self
    }

    #[must_use]
    pub fn max_idle_secs(mut self, secs: u64) -> Self {
        self.max_idle_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn stealth_mode(mut self, enabled: bool) -> Self {
        self.stealth_mode = Some(enabled);
        self
    }

    #[must_use]
    pub fn executable_path(mut self, path: PathBuf) -> Self {
        self.executable_path = Some(path);
        self
    }

    #[must_use]
    pub fn download_on_demand(mut self, enabled: bool) -> Self {
        self.download_on_demand = Some(enabled);
        self
    }

    #[must_use]
    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.cache_ttl_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn headless(mut self, enabled: bool) -> Self {
        self.headless = Some(enabled);
        self
    }

    /// Build the config, validating timeout bounds and pool sizing
    ///
    /// # Errors
    /// Returns an error if `min_timeout <= default_timeout <= max_timeout`
    /// does not hold, any timeout is non-positive, or `max_instances` is zero.
    pub fn build(self) -> anyhow::Result<ScrapeConfig> {
        let defaults = ScrapeConfig::default();

        let config = ScrapeConfig {
            default_timeout_secs: self
                .default_timeout_secs
                .unwrap_or(defaults.default_timeout_secs),
            min_timeout_secs: self.min_timeout_secs.unwrap_or(defaults.min_timeout_secs),
            max_timeout_secs: self.max_timeout_secs.unwrap_or(defaults.max_timeout_secs),
            max_instances: self.max_instances.unwrap_or(defaults.max_instances),
            max_idle_secs: self.max_idle_secs.unwrap_or(defaults.max_idle_secs),
            stealth_mode: self.stealth_mode.unwrap_or(defaults.stealth_mode),
            executable_path: self.executable_path,
            download_on_demand: self
                .download_on_demand
                .unwrap_or(defaults.download_on_demand),
            cache_ttl_secs: self.cache_ttl_secs.unwrap_or(defaults.cache_ttl_secs),
            headless: self.headless.unwrap_or(defaults.headless),
        };

        if config.min_timeout_secs <= 0.0 {
            anyhow::bail!(
                "min_timeout_secs must be positive, got {}",
                config.min_timeout_secs
            );
        }
        if config.min_timeout_secs > config.max_timeout_secs {
            anyhow::bail!(
                "min_timeout_secs ({}) must not exceed max_timeout_secs ({})",
                config.min_timeout_secs,
                config.max_timeout_secs
            );
        }
        if config.default_timeout_secs < config.min_timeout_secs
            || config.default_timeout_secs > config.max_timeout_secs
        {
            anyhow::bail!(
                "default_timeout_secs ({}) must lie within [{}, {}]",
                config.default_timeout_secs,
                config.min_timeout_secs,
                config.max_timeout_secs
            );
        }
        if config.max_instances == 0 {
            anyhow::bail!("max_instances must be at least 1");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ScrapeConfigBuilder::default().build().expect("defaults build");
        assert!(config.min_timeout_secs() <= config.default_timeout_secs());
        assert!(config.default_timeout_secs() <= config.max_timeout_secs());
        assert!(config.max_instances() >= 1);
    }

    #[test]
    fn test_rejects_inverted_timeout_range() {
        let result = ScrapeConfig::builder()
            .min_timeout_secs(20.0)
            .max_timeout_secs(5.0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_default_outside_range() {
        let result = ScrapeConfig::builder()
            .min_timeout_secs(3.0)
            .max_timeout_secs(10.0)
            .default_timeout_secs(15.0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_zero_instances() {
        let result = ScrapeConfig::builder().max_instances(0).build();
        assert!(result.is_err());
    }
}
