//! Plain-text report of a batch run

use ldtest_core::{Target, TargetStats};
use std::collections::BTreeMap;
use std::fmt::Write;

const SECTION_RULE: &str = "=======================================";
const RESULT_RULE: &str = "---------------------------------------";

/// Render per-target statistics, one block per URL in target order
pub fn render_targets(stats: &BTreeMap<Target, TargetStats>) -> String {
    render(stats.iter().map(|(target, stats)| (target.url(), stats)))
}

/// Render statistics rolled up per host
pub fn render_hosts(stats: &BTreeMap<String, TargetStats>) -> String {
    render(stats.iter().map(|(host, stats)| (host.as_str(), stats)))
}

fn render<'a>(entries: impl Iterator<Item = (&'a str, &'a TargetStats)>) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(out, "{}", SECTION_RULE);

    for (name, stats) in entries {
        let _ = writeln!(out, "Load test for {}.", name);
        let _ = writeln!(out, "Total sends requests {}.", stats.total_requests);
        let _ = writeln!(out, "Failed requests {}.", stats.error_requests);
        let _ = writeln!(out, "Slow requests {}.", stats.slow_requests);
        let _ = writeln!(out, "Max request time {} s.", stats.max_latency_seconds);
        let _ = writeln!(out, "{}", RESULT_RULE);
        let _ = writeln!(
            out,
            "Recommended requests count {}",
            stats.recommended_concurrency
        );
        let _ = writeln!(out, "{}", SECTION_RULE);
    }

    out
}
