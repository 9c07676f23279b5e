//! Load test defaults

use crate::error::ConfigResult;
use crate::validation::{validate_enum_choice, validate_positive, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Methods accepted for load test requests
pub const SUPPORTED_METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// Static load test configuration; per-request overrides are layered on top in server mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadTestConfig {
    /// Idle connections kept per target host
    #[serde(default = "default_max_idle_conns_per_host")]
    pub max_idle_conns_per_host: usize,

    #[serde(default = "crate::domains::utils::default_false")]
    pub disable_compression: bool,

    #[serde(default = "crate::domains::utils::default_false")]
    pub disable_keep_alive: bool,

    #[serde(default = "crate::domains::utils::default_false")]
    pub use_http2: bool,

    /// Latency at or above which a response counts as slow
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_timeout"
    )]
    pub timeout: Duration,

    #[serde(default = "default_method")]
    pub method: String,

    /// Value of the `Accept` header; omitted when empty
    #[serde(default)]
    pub accept_header: String,

    /// Value of the `User-Agent` header; omitted when empty
    #[serde(default)]
    pub user_agent: String,

    /// Wall-clock budget for one load run in server mode
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_stress_test_timeout"
    )]
    pub stress_test_timeout: Duration,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            max_idle_conns_per_host: default_max_idle_conns_per_host(),
            disable_compression: false,
            disable_keep_alive: false,
            use_http2: false,
            timeout: default_timeout(),
            method: default_method(),
            accept_header: String::new(),
            user_agent: String::new(),
            stress_test_timeout: default_stress_test_timeout(),
        }
    }
}

impl Validatable for LoadTestConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_positive(
            self.max_idle_conns_per_host,
            "max_idle_conns_per_host",
            self.domain_name(),
        )?;
        validate_positive(self.timeout.as_secs(), "timeout", self.domain_name())?;
        validate_positive(
            self.stress_test_timeout.as_secs(),
            "stress_test_timeout",
            self.domain_name(),
        )?;
        validate_enum_choice(&self.method, &SUPPORTED_METHODS, "method", self.domain_name())?;
        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "load_test"
    }
}

fn default_max_idle_conns_per_host() -> usize {
    200
}

fn default_timeout() -> Duration {
    Duration::from_secs(3)
}

fn default_method() -> String {
    "GET".to_string()
}

fn default_stress_test_timeout() -> Duration {
    Duration::from_secs(30)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_test_defaults() {
        let config = LoadTestConfig::default();
        assert_eq!(config.max_idle_conns_per_host, 200);
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.method, "GET");
        assert_eq!(config.stress_test_timeout, Duration::from_secs(30));
        assert!(!config.use_http2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_test_validation() {
        let mut config = LoadTestConfig {
            method: "FETCH".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.method = "post".to_string();
        assert!(config.validate().is_ok());

        config.timeout = Duration::from_secs(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: LoadTestConfig = serde_yaml::from_str("timeout: 5\nuse_http2: true\n").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.use_http2);
        assert_eq!(config.max_idle_conns_per_host, 200);
        assert_eq!(config.method, "GET");
    }
}
