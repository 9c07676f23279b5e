//! Per-host merging of per-URL statistics

use ldtest_core::{Target, TargetStats};
use std::collections::BTreeMap;

/// Merge per-URL statistics into per-host statistics.
///
/// Counts are summed and the maximum latency kept. The recommendation is a running
/// average folded in target order, rounded half away from zero at every step.
pub fn rollup_by_host(stats: &BTreeMap<Target, TargetStats>) -> BTreeMap<String, TargetStats> {
    let mut hosts: BTreeMap<String, (TargetStats, u64)> = BTreeMap::new();

    for (target, item) in stats {
        let (merged, folded) = hosts.entry(target.host().to_string()).or_default();

        if item.max_latency_seconds > merged.max_latency_seconds {
            merged.max_latency_seconds = item.max_latency_seconds;
        }
        merged.total_requests += item.total_requests;
        merged.error_requests += item.error_requests;
        merged.slow_requests += item.slow_requests;
        merged.recommended_concurrency = running_average(
            *folded,
            merged.recommended_concurrency,
            item.recommended_concurrency,
        );
        *folded += 1;
    }

    hosts
        .into_iter()
        .map(|(host, (merged, _))| (host, merged))
        .collect()
}

fn running_average(count: u64, current: u64, value: u64) -> u64 {
    if count == 0 {
        return value;
    }

    let sum = count as f64 * current as f64 + value as f64;
    (sum / (count + 1) as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(recommended: u64, total: u64, max_latency: f64) -> TargetStats {
        TargetStats {
            total_requests: total,
            error_requests: 1,
            slow_requests: 0,
            max_latency_seconds: max_latency,
            recommended_concurrency: recommended,
        }
    }

    #[test]
    fn test_two_urls_average_their_recommendations() {
        let mut input = BTreeMap::new();
        input.insert(Target::parse("http://a.test/1").unwrap(), stats(10, 11, 0.5));
        input.insert(Target::parse("http://a.test/2").unwrap(), stats(20, 21, 1.5));
        input.insert(Target::parse("http://b.test/").unwrap(), stats(7, 8, 0.2));

        let hosts = rollup_by_host(&input);
        assert_eq!(hosts.len(), 2);

        let a = hosts["a.test"];
        assert_eq!(a.recommended_concurrency, 15);
        assert_eq!(a.total_requests, 32);
        assert_eq!(a.error_requests, 2);
        assert_eq!(a.max_latency_seconds, 1.5);

        assert_eq!(hosts["b.test"], stats(7, 8, 0.2));
    }

    #[test]
    fn test_running_average_rounds_each_step() {
        assert_eq!(running_average(0, 0, 10), 10);
        assert_eq!(running_average(1, 10, 20), 15);
        // (2 * 15 + 40) / 3 = 23.33
        assert_eq!(running_average(2, 15, 40), 23);
        // (1 + 2) / 2 = 1.5 rounds away from zero
        assert_eq!(running_average(1, 1, 2), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(rollup_by_host(&BTreeMap::new()).is_empty());
    }
}
