//! Per-run load test configuration and its fingerprint

use crate::error::{CoreError, Result};
use crate::types::HttpMethod;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::Duration;

/// Configuration for one load run. Immutable once the run starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadTestConfig {
    pub max_idle_conns_per_host: usize,
    pub disable_compression: bool,
    pub disable_keep_alive: bool,
    pub use_http2: bool,
    /// Latency at or above which a response counts as slow. Not a network timeout.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub method: HttpMethod,
    /// Sent as `Accept` when non-empty
    pub accept_header: String,
    /// Sent as `User-Agent` when non-empty
    pub user_agent: String,
}

impl Default for LoadTestConfig {
    fn default() -> Self {
        Self {
            max_idle_conns_per_host: 200,
            disable_compression: false,
            disable_keep_alive: false,
            use_http2: false,
            timeout: Duration::from_secs(3),
            method: HttpMethod::Get,
            accept_header: String::new(),
            user_agent: String::new(),
        }
    }
}

impl LoadTestConfig {
    /// Hex SHA-256 digest of this configuration's JSON form
    pub fn fingerprint(&self) -> Result<Fingerprint> {
        let bytes = serde_json::to_vec(self)?;
        Ok(Fingerprint(hex::encode(Sha256::digest(&bytes))))
    }
}

impl TryFrom<&ldtest_config::LoadTestConfig> for LoadTestConfig {
    type Error = CoreError;

    fn try_from(config: &ldtest_config::LoadTestConfig) -> Result<Self> {
        if config.max_idle_conns_per_host == 0 {
            return Err(CoreError::InvalidConfig(
                "max_idle_conns_per_host must be positive".to_string(),
            ));
        }
        if config.timeout.is_zero() {
            return Err(CoreError::InvalidConfig("timeout must be positive".to_string()));
        }

        Ok(Self {
            max_idle_conns_per_host: config.max_idle_conns_per_host,
            disable_compression: config.disable_compression,
            disable_keep_alive: config.disable_keep_alive,
            use_http2: config.use_http2,
            timeout: config.timeout,
            method: config.method.parse()?,
            accept_header: config.accept_header.clone(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// Configuration fingerprint used to key cached results
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-request overrides layered on top of the static configuration.
///
/// Each field left as `None` falls through to the next layer. Layers combine with
/// [`ConfigOverrides::or`] (the receiver wins) and resolve with [`ConfigOverrides::apply`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub max_idle_conns_per_host: Option<usize>,
    pub timeout: Option<Duration>,
    pub disable_compression: Option<bool>,
    pub disable_keep_alive: Option<bool>,
    pub method: Option<HttpMethod>,
    pub accept_header: Option<String>,
    pub user_agent: Option<String>,
}

impl ConfigOverrides {
    /// Merge two layers field by field, preferring values from `self`
    pub fn or(self, fallback: ConfigOverrides) -> ConfigOverrides {
        ConfigOverrides {
            max_idle_conns_per_host: self.max_idle_conns_per_host.or(fallback.max_idle_conns_per_host),
            timeout: self.timeout.or(fallback.timeout),
            disable_compression: self.disable_compression.or(fallback.disable_compression),
            disable_keep_alive: self.disable_keep_alive.or(fallback.disable_keep_alive),
            method: self.method.or(fallback.method),
            accept_header: self.accept_header.or(fallback.accept_header),
            user_agent: self.user_agent.or(fallback.user_agent),
        }
    }

    /// Resolve the overrides against a base configuration
    pub fn apply(&self, base: &LoadTestConfig) -> LoadTestConfig {
        let mut config = base.clone();

        if let Some(max_idle) = self.max_idle_conns_per_host {
            config.max_idle_conns_per_host = max_idle;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(disable) = self.disable_compression {
            config.disable_compression = disable;
        }
        if let Some(disable) = self.disable_keep_alive {
            config.disable_keep_alive = disable;
        }
        if let Some(method) = self.method {
            config.method = method;
        }
        if let Some(accept) = &self.accept_header {
            config.accept_header = accept.clone();
        }
        if let Some(user_agent) = &self.user_agent {
            config.user_agent = user_agent.clone();
        }

        config
    }

    pub fn is_empty(&self) -> bool {
        *self == ConfigOverrides::default()
    }
}
