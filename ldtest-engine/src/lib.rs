//! ldtest load engine
//!
//! The engine runs one [`LoadGenerator`] per target. Each generator launches rounds of
//! concurrent requests, growing the round size by one until the target shows its first
//! error or the run is cancelled. Every outcome flows through a bounded channel into
//! the [`ResultAggregator`], which owns the per-target statistics.

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod generator;
pub mod observer;
pub mod rollup;
pub mod throttle;

// Re-export main types
pub use aggregator::ResultAggregator;
pub use engine::{Engine, RunReport, RESULT_CHANNEL_SIZE};
pub use error::{EngineError, EngineResult};
pub use generator::{GeneratorExit, GeneratorReport, LoadGenerator};
pub use observer::{NoopObserver, RunObserver};
pub use rollup::rollup_by_host;
pub use throttle::ThrottleTracker;
