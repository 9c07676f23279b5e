//! Core domain types for ldtest
//!
//! This crate defines the vocabulary shared by the executor, the engine, the cache
//! and the service boundary. It has no runtime dependencies.

pub mod config;
pub mod error;
pub mod outcome;
pub mod stats;
pub mod target;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{ConfigOverrides, Fingerprint, LoadTestConfig};
pub use error::{CoreError, Result};
pub use outcome::{FailureKind, PhaseTimings, RequestOutcome};
pub use stats::TargetStats;
pub use target::Target;
pub use types::HttpMethod;
