//! Result cache configuration

use crate::error::ConfigResult;
use crate::validation::{validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a completed load test result is reused
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_ttl"
    )]
    pub ttl: Duration,

    /// Interval between sweeps of expired entries
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_sweep_interval"
    )]
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: default_ttl(),
            sweep_interval: default_sweep_interval(),
        }
    }
}

impl Validatable for CacheConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(self.ttl.as_secs(), "ttl", self.domain_name())?;
        validate_positive(
            self.sweep_interval.as_secs(),
            "sweep_interval",
            self.domain_name(),
        )?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "cache"
    }
}

fn default_ttl() -> Duration {
    Duration::from_secs(6 * 60 * 60)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(21600));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_config_rejects_zero_sweep_interval() {
        let config = CacheConfig {
            sweep_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
