//! Executor traits consumed by the load engine

use crate::errors::HttpError;
use ldtest_core::{LoadTestConfig, RequestOutcome, Target};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Round a request belongs to
#[derive(Debug, Clone, Copy)]
pub struct RoundContext {
    /// Number of requests launched concurrently in this round
    pub concurrency: usize,
    pub started_at: Instant,
}

impl RoundContext {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency,
            started_at: Instant::now(),
        }
    }
}

/// Performs exactly one request attempt and reports its outcome.
///
/// Implementations never retry and never fail: every attempt yields one
/// [`RequestOutcome`]. Cancellation of `cancel` aborts in-flight I/O.
#[async_trait::async_trait]
pub trait RequestExecutor: Send + Sync {
    async fn execute(
        &self,
        target: &Target,
        round: RoundContext,
        cancel: &CancellationToken,
    ) -> RequestOutcome;
}

/// Builds one executor per target for a run
pub trait ExecutorFactory: Send + Sync {
    fn build(
        &self,
        target: &Target,
        config: &LoadTestConfig,
    ) -> Result<Arc<dyn RequestExecutor>, HttpError>;
}
