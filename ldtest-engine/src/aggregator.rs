//! Per-target statistics aggregation

use ldtest_core::{RequestOutcome, Target, TargetStats};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Folds request outcomes into per-target statistics under a single lock
#[derive(Debug)]
pub struct ResultAggregator {
    slow_threshold: Duration,
    stats: Mutex<BTreeMap<Target, TargetStats>>,
}

impl ResultAggregator {
    pub fn new(slow_threshold: Duration) -> Self {
        Self {
            slow_threshold,
            stats: Mutex::new(BTreeMap::new()),
        }
    }

    /// Make sure `target` appears in snapshots even if it records nothing
    pub fn register(&self, target: &Target) {
        self.stats.lock().entry(target.clone()).or_default();
    }

    pub fn record_outcome(&self, outcome: &RequestOutcome) {
        let mut stats = self.stats.lock();
        let entry = stats.entry(outcome.target.clone()).or_default();

        entry.total_requests += 1;

        if outcome.is_error() {
            entry.error_requests += 1;
            return;
        }

        let latency = outcome.total.as_secs_f64();
        if latency > entry.max_latency_seconds {
            entry.max_latency_seconds = latency;
        }

        if outcome.total >= self.slow_threshold {
            entry.slow_requests += 1;
            return;
        }

        if !entry.is_degraded() {
            entry.recommended_concurrency += 1;
        }
    }

    /// Drain `receiver` until every sender is gone. Returns the number of outcomes read.
    pub async fn consume(&self, mut receiver: mpsc::Receiver<RequestOutcome>) -> u64 {
        let mut consumed = 0;
        while let Some(outcome) = receiver.recv().await {
            self.record_outcome(&outcome);
            consumed += 1;
        }

        debug!("Result stream closed after {} outcomes", consumed);
        consumed
    }

    pub fn snapshot(&self) -> BTreeMap<Target, TargetStats> {
        self.stats.lock().clone()
    }
}
