//! Run orchestration: one generator per target, one aggregator per run

use crate::aggregator::ResultAggregator;
use crate::error::{EngineError, EngineResult};
use crate::generator::{GeneratorExit, GeneratorReport, LoadGenerator};
use crate::observer::{NoopObserver, RunObserver};
use crate::throttle::ThrottleTracker;
use ldtest_core::{LoadTestConfig, Target, TargetStats};
use ldtest_http::ExecutorFactory;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Capacity of the outcome channel between requests and the aggregator
pub const RESULT_CHANNEL_SIZE: usize = 10_000;

/// Everything a finished (or cancelled) run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Final statistics for every target, ordered by target
    pub stats: BTreeMap<Target, TargetStats>,
    /// Concurrency level at throttle, keyed by URL
    pub throttles: BTreeMap<String, usize>,
    pub generators: Vec<GeneratorReport>,
}

impl RunReport {
    /// True when at least one generator stopped because the run was cancelled
    pub fn was_cancelled(&self) -> bool {
        self.generators
            .iter()
            .any(|g| g.exit == GeneratorExit::Cancelled)
    }
}

/// Load test engine for one configuration
pub struct Engine {
    config: LoadTestConfig,
    factory: Arc<dyn ExecutorFactory>,
    observer: Arc<dyn RunObserver>,
}

impl Engine {
    pub fn new(config: LoadTestConfig, factory: Arc<dyn ExecutorFactory>) -> Self {
        Self {
            config,
            factory,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &LoadTestConfig {
        &self.config
    }

    /// Load test `targets` until each one throttles or `cancel` fires.
    ///
    /// Duplicate targets are tested once. Cancellation is not an error: the report
    /// then holds the statistics gathered so far.
    pub async fn run(
        &self,
        targets: &[Target],
        cancel: &CancellationToken,
    ) -> EngineResult<RunReport> {
        let targets: Vec<Target> = targets
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if targets.is_empty() {
            return Ok(RunReport::default());
        }

        // Build every client before any request goes out
        let mut executors = Vec::with_capacity(targets.len());
        for target in &targets {
            let executor = self
                .factory
                .build(target, &self.config)
                .map_err(|source| EngineError::Executor {
                    url: target.url().to_string(),
                    source,
                })?;
            executors.push((target.clone(), executor));
        }

        info!("Starting load run for {} targets", targets.len());
        self.observer.run_started(&targets);

        let throttle = Arc::new(ThrottleTracker::new());
        let aggregator = Arc::new(ResultAggregator::new(self.config.timeout));
        for target in &targets {
            aggregator.register(target);
        }

        let (results_tx, results_rx) = mpsc::channel(RESULT_CHANNEL_SIZE);
        let consumer = {
            let aggregator = aggregator.clone();
            tokio::spawn(async move { aggregator.consume(results_rx).await })
        };

        let mut generators = JoinSet::new();
        for (target, executor) in executors {
            let generator = LoadGenerator::new(
                target,
                executor,
                throttle.clone(),
                results_tx.clone(),
                cancel.clone(),
                self.observer.clone(),
            );
            generators.spawn(generator.run());
        }
        // Generators hold the only remaining senders; the stream closes when they finish
        drop(results_tx);

        let mut reports = Vec::with_capacity(targets.len());
        while let Some(joined) = generators.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => error!("Load generator task failed: {}", e),
            }
        }
        reports.sort_by(|a, b| a.target.cmp(&b.target));

        let consumed = consumer.await?;
        info!(
            "Load run finished: {} outcomes, cancelled: {}",
            consumed,
            cancel.is_cancelled()
        );

        Ok(RunReport {
            stats: aggregator.snapshot(),
            throttles: throttle.snapshot(),
            generators: reports,
        })
    }
}
