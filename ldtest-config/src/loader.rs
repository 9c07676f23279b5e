//! Configuration loading and environment variable handling

use crate::domains::LdtestConfig;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "LDTEST".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<LdtestConfig> {
        let path = path.as_ref();
        debug!("Loading configuration from {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let mut config: LdtestConfig = if content.trim().is_empty() {
            LdtestConfig::default()
        } else {
            serde_yaml::from_str(&content)?
        };

        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<LdtestConfig> {
        let mut config = LdtestConfig::default();
        self.apply_env_overrides(&mut config)?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration with fallback chain
    pub fn load(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<LdtestConfig> {
        match config_path {
            Some(path) => self.from_file(path),
            None => self.from_env(),
        }
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut LdtestConfig) -> ConfigResult<()> {
        self.apply_logging_overrides(&mut config.logging)?;
        self.apply_server_overrides(&mut config.server)?;
        self.apply_load_test_overrides(&mut config.load_test)?;
        self.apply_cache_overrides(&mut config.cache)?;
        Ok(())
    }

    /// Apply logging config overrides
    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Apply server config overrides
    fn apply_server_overrides(
        &self,
        config: &mut crate::domains::server::ServerConfig,
    ) -> ConfigResult<()> {
        if let Ok(bind) = self.get_env_var("SERVER_BIND_ADDRESS") {
            config.bind_address = bind;
        }

        if let Some(port) = self.parse_env_var("SERVER_PORT")? {
            config.port = port;
        }

        if let Some(timeout) = self.parse_env_seconds("SERVER_READ_TIMEOUT")? {
            config.read_timeout = timeout;
        }

        if let Some(timeout) = self.parse_env_seconds("SERVER_WRITE_TIMEOUT")? {
            config.write_timeout = timeout;
        }

        Ok(())
    }

    /// Apply load test config overrides
    fn apply_load_test_overrides(
        &self,
        config: &mut crate::domains::load_test::LoadTestConfig,
    ) -> ConfigResult<()> {
        if let Some(max_idle) = self.parse_env_var("LOAD_MAX_IDLE_CONNS_PER_HOST")? {
            config.max_idle_conns_per_host = max_idle;
        }

        if let Some(disable) = self.parse_env_var("LOAD_DISABLE_COMPRESSION")? {
            config.disable_compression = disable;
        }

        if let Some(disable) = self.parse_env_var("LOAD_DISABLE_KEEP_ALIVE")? {
            config.disable_keep_alive = disable;
        }

        if let Some(use_http2) = self.parse_env_var("LOAD_USE_HTTP2")? {
            config.use_http2 = use_http2;
        }

        if let Some(timeout) = self.parse_env_seconds("LOAD_TIMEOUT")? {
            config.timeout = timeout;
        }

        if let Some(timeout) = self.parse_env_seconds("LOAD_STRESS_TEST_TIMEOUT")? {
            config.stress_test_timeout = timeout;
        }

        if let Ok(method) = self.get_env_var("LOAD_METHOD") {
            config.method = method.to_uppercase();
        }

        if let Ok(accept) = self.get_env_var("LOAD_ACCEPT_HEADER") {
            config.accept_header = accept;
        }

        if let Ok(user_agent) = self.get_env_var("LOAD_USER_AGENT") {
            config.user_agent = user_agent;
        }

        Ok(())
    }

    /// Apply cache config overrides
    fn apply_cache_overrides(
        &self,
        config: &mut crate::domains::cache::CacheConfig,
    ) -> ConfigResult<()> {
        if let Some(ttl) = self.parse_env_seconds("CACHE_TTL")? {
            config.ttl = ttl;
        }

        if let Some(interval) = self.parse_env_seconds("CACHE_SWEEP_INTERVAL")? {
            config.sweep_interval = interval;
        }

        Ok(())
    }

    /// Parse an optional environment variable into `T`
    fn parse_env_var<T>(&self, name: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_env_var(name) {
            Ok(raw) => raw
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::EnvError(format!("Invalid {}: {}", name, e))),
            Err(_) => Ok(None),
        }
    }

    /// Parse an optional environment variable holding whole seconds
    fn parse_env_seconds(&self, name: &str) -> ConfigResult<Option<Duration>> {
        Ok(self.parse_env_var::<u64>(name)?.map(Duration::from_secs))
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
