//! Shared state for REST handlers

use ldtest_caching::ResultCache;
use ldtest_config::LdtestConfig;
use ldtest_core::{CoreError, LoadTestConfig};
use ldtest_http::ExecutorFactory;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Dependencies of the load endpoint
#[derive(Clone)]
pub struct LoadContext {
    /// Static configuration that per-request overrides are layered on
    pub base_config: LoadTestConfig,
    /// Wall-clock budget of one load run
    pub stress_test_timeout: Duration,
    /// Lifetime of cached results
    pub cache_ttl: Duration,
    pub cache: Arc<ResultCache>,
    pub executors: Arc<dyn ExecutorFactory>,
    /// Cancelled on server shutdown; every run uses a child token
    pub shutdown: CancellationToken,
}

impl LoadContext {
    pub fn new(
        base_config: LoadTestConfig,
        stress_test_timeout: Duration,
        cache_ttl: Duration,
        cache: Arc<ResultCache>,
        executors: Arc<dyn ExecutorFactory>,
    ) -> Self {
        Self {
            base_config,
            stress_test_timeout,
            cache_ttl,
            cache,
            executors,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn from_config(
        config: &LdtestConfig,
        cache: Arc<ResultCache>,
        executors: Arc<dyn ExecutorFactory>,
    ) -> Result<Self, CoreError> {
        Ok(Self::new(
            LoadTestConfig::try_from(&config.load_test)?,
            config.load_test.stress_test_timeout,
            config.cache.ttl,
            cache,
            executors,
        ))
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}
