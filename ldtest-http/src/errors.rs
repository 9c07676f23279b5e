//! HTTP error types

/// Error type for building request executors.
///
/// Failures of individual requests are never errors; they are classified into
/// [`ldtest_core::FailureKind`] and recorded as outcomes.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),

    #[error("Invalid value for header {name}: {reason}")]
    InvalidHeader { name: &'static str, reason: String },
}
