//! Per-target progress bars for batch runs

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use ldtest_core::Target;
use ldtest_engine::{GeneratorExit, GeneratorReport, RunObserver};
use std::collections::HashMap;
use std::time::Duration;

/// Shows one spinner per target with its current round
pub struct ProgressObserver {
    multi: MultiProgress,
    bars: HashMap<Target, ProgressBar>,
}

impl ProgressObserver {
    /// Progress drawn on stderr
    pub fn new(targets: &[Target]) -> Self {
        Self::with_draw_target(targets, ProgressDrawTarget::stderr())
    }

    /// Progress that is tracked but never drawn
    pub fn hidden(targets: &[Target]) -> Self {
        Self::with_draw_target(targets, ProgressDrawTarget::hidden())
    }

    fn with_draw_target(targets: &[Target], draw_target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(draw_target);
        let style = ProgressStyle::with_template("{spinner:.green} {prefix:.bold} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bars = targets
            .iter()
            .map(|target| {
                let bar = multi.add(ProgressBar::new_spinner());
                bar.set_style(style.clone());
                bar.set_prefix(target.url().to_string());
                bar.set_message("waiting");
                (target.clone(), bar)
            })
            .collect();

        Self { multi, bars }
    }

    /// Round counter of a target's bar
    pub fn rounds(&self, target: &Target) -> Option<u64> {
        self.bars.get(target).map(ProgressBar::position)
    }

    /// Run `f` with the bars hidden so plain output does not interleave with them
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.multi.suspend(f)
    }
}

impl RunObserver for ProgressObserver {
    fn run_started(&self, _targets: &[Target]) {
        for bar in self.bars.values() {
            bar.enable_steady_tick(Duration::from_millis(120));
        }
    }

    fn round_started(&self, target: &Target, concurrency: usize) {
        if let Some(bar) = self.bars.get(target) {
            bar.inc(1);
            bar.set_message(format!("round {} ({} concurrent)", bar.position(), concurrency));
        }
    }

    fn generator_finished(&self, report: &GeneratorReport) {
        let Some(bar) = self.bars.get(&report.target) else {
            return;
        };

        match report.exit {
            GeneratorExit::Throttled { level } => {
                bar.finish_with_message(format!("throttled at {} concurrent", level))
            }
            GeneratorExit::Cancelled => bar.finish_with_message(format!(
                "cancelled after {} rounds at {} concurrent",
                report.rounds, report.last_concurrency
            )),
        }
    }
}
