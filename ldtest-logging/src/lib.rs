//! Structured logging setup for ldtest
//!
//! All crates log through `tracing`; this crate installs the global subscriber
//! from the `logging` configuration domain.

pub mod init;

pub use init::{init_logging_from_config, init_simple_tracing};
pub use ldtest_config::domains::logging::{LogFormat, LogLevel, LoggingConfig};
