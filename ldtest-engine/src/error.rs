//! Error types for load runs

use ldtest_http::HttpError;
use thiserror::Error;

/// Errors that prevent a load run from producing a report.
///
/// Individual request failures are statistics, not errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to prepare executor for {url}: {source}")]
    Executor {
        url: String,
        #[source]
        source: HttpError,
    },

    #[error("Result aggregation task failed: {0}")]
    Aggregation(#[from] tokio::task::JoinError),
}

pub type EngineResult<T> = Result<T, EngineError>;
