//! Domain-driven configuration management for ldtest
//!
//! Configuration is split by functional domain (logging, server, load testing,
//! result caching). Every domain carries its own defaults and validation, and the
//! loader applies `LDTEST_*` environment overrides on top of an optional YAML file.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    cache::CacheConfig, load_test::LoadTestConfig, logging::LoggingConfig, server::ServerConfig,
    LdtestConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
