//! Domain-specific configuration modules

pub mod cache;
pub mod load_test;
pub mod logging;
pub mod server;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Main ldtest configuration combining all domains
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LdtestConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,

    /// HTTP service configuration (server mode)
    #[serde(default)]
    pub server: server::ServerConfig,

    /// Load test defaults applied to every run
    #[serde(default)]
    pub load_test: load_test::LoadTestConfig,

    /// Result cache configuration (server mode)
    #[serde(default)]
    pub cache: cache::CacheConfig,
}

impl LdtestConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.logging.validate()?;
        self.server.validate()?;
        self.load_test.validate()?;
        self.cache.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let config = LdtestConfig::default();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
