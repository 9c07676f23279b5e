//! Aggregated per-target statistics

use serde::{Deserialize, Serialize};

/// Statistics accumulated for one target (or one host after rollup)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetStats {
    pub total_requests: u64,
    pub error_requests: u64,
    pub slow_requests: u64,
    pub max_latency_seconds: f64,
    /// Number of outcomes recorded before the first error or slow response
    pub recommended_concurrency: u64,
}

impl TargetStats {
    /// True once an error or slow response has frozen the recommendation
    pub fn is_degraded(&self) -> bool {
        self.error_requests > 0 || self.slow_requests > 0
    }
}
