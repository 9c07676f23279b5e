//! Escalating-concurrency load generation for a single target

use crate::observer::RunObserver;
use crate::throttle::ThrottleTracker;
use ldtest_core::{RequestOutcome, Target};
use ldtest_http::{RequestExecutor, RoundContext};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Why a generator stopped escalating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorExit {
    /// An error was observed at the given concurrency level
    Throttled { level: usize },
    Cancelled,
}

/// Summary of one generator's lifetime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorReport {
    pub target: Target,
    pub exit: GeneratorExit,
    /// Number of rounds launched
    pub rounds: usize,
    /// Concurrency of the last round launched (1 when no round ran)
    pub last_concurrency: usize,
}

/// Drives rounds of concurrent requests against one target.
///
/// Starting from one, every round launches one request more than the previous
/// round and waits for all of them. The loop stops as soon as the run is cancelled
/// or the throttle tracker has a level for the target.
pub struct LoadGenerator {
    target: Target,
    executor: Arc<dyn RequestExecutor>,
    throttle: Arc<ThrottleTracker>,
    results: mpsc::Sender<RequestOutcome>,
    cancel: CancellationToken,
    observer: Arc<dyn RunObserver>,
}

impl LoadGenerator {
    pub fn new(
        target: Target,
        executor: Arc<dyn RequestExecutor>,
        throttle: Arc<ThrottleTracker>,
        results: mpsc::Sender<RequestOutcome>,
        cancel: CancellationToken,
        observer: Arc<dyn RunObserver>,
    ) -> Self {
        Self {
            target,
            executor,
            throttle,
            results,
            cancel,
            observer,
        }
    }

    pub async fn run(self) -> GeneratorReport {
        let url = self.target.url();
        let mut concurrency = 1;
        let mut rounds = 0;

        let exit = loop {
            if self.cancel.is_cancelled() {
                info!(url, rounds, concurrency, "worker canceled");
                break GeneratorExit::Cancelled;
            }

            if self.throttle.is_throttled(url) {
                let level = self.throttle.current_level(url);
                info!(url, rounds, level, "worker stopped");
                break GeneratorExit::Throttled { level };
            }

            concurrency += 1;
            rounds += 1;
            debug!(url, concurrency, "round started");
            self.observer.round_started(&self.target, concurrency);

            self.run_round(RoundContext::new(concurrency)).await;
        };

        let report = GeneratorReport {
            target: self.target.clone(),
            exit,
            rounds,
            last_concurrency: concurrency,
        };
        self.observer.generator_finished(&report);
        report
    }

    async fn run_round(&self, round: RoundContext) {
        let mut requests = JoinSet::new();

        for _ in 0..round.concurrency {
            let step = RequestStep {
                target: self.target.clone(),
                executor: self.executor.clone(),
                throttle: self.throttle.clone(),
                results: self.results.clone(),
                cancel: self.cancel.clone(),
            };
            requests.spawn(step.run(round));
        }

        while let Some(joined) = requests.join_next().await {
            if let Err(e) = joined {
                warn!("Request task for {} failed: {}", self.target, e);
            }
        }
    }
}

/// One request attempt within a round
struct RequestStep {
    target: Target,
    executor: Arc<dyn RequestExecutor>,
    throttle: Arc<ThrottleTracker>,
    results: mpsc::Sender<RequestOutcome>,
    cancel: CancellationToken,
}

impl RequestStep {
    async fn run(self, round: RoundContext) {
        if self.cancel.is_cancelled() {
            return;
        }

        let outcome = self
            .executor
            .execute(&self.target, round, &self.cancel)
            .await;

        if outcome.is_error() {
            self.throttle
                .record_throttle(self.target.url(), round.concurrency);
        }

        if self.results.send(outcome).await.is_err() {
            debug!("Result stream closed, dropping outcome for {}", self.target);
        }
    }
}
