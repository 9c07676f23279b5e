//! Progress hooks for load runs

use crate::generator::GeneratorReport;
use ldtest_core::Target;

/// Receives progress notifications from a running engine.
///
/// Callbacks run on engine tasks and must not block.
pub trait RunObserver: Send + Sync {
    fn run_started(&self, _targets: &[Target]) {}

    fn round_started(&self, _target: &Target, _concurrency: usize) {}

    fn generator_finished(&self, _report: &GeneratorReport) {}
}

/// Observer that ignores every notification
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}
