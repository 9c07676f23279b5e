//! Per-target throttle detection

use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Records, per target URL, the concurrency level at which degradation was first seen.
///
/// The first write for a URL wins; later writes are ignored.
#[derive(Debug, Default)]
pub struct ThrottleTracker {
    levels: Mutex<HashMap<String, usize>>,
}

impl ThrottleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a throttle for `url` at `level`. Returns whether this call set it.
    pub fn record_throttle(&self, url: &str, level: usize) -> bool {
        let mut levels = self.levels.lock();
        if levels.contains_key(url) {
            return false;
        }

        levels.insert(url.to_string(), level);
        debug!("Throttle detected for {} at concurrency {}", url, level);
        true
    }

    /// Concurrency level at throttle, or 0 if the URL has not throttled
    pub fn current_level(&self, url: &str) -> usize {
        self.levels.lock().get(url).copied().unwrap_or(0)
    }

    pub fn is_throttled(&self, url: &str) -> bool {
        self.levels.lock().contains_key(url)
    }

    pub fn snapshot(&self) -> BTreeMap<String, usize> {
        self.levels
            .lock()
            .iter()
            .map(|(url, level)| (url.clone(), *level))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_first_write_wins() {
        let tracker = ThrottleTracker::new();
        assert_eq!(tracker.current_level("http://a.test/"), 0);
        assert!(!tracker.is_throttled("http://a.test/"));

        assert!(tracker.record_throttle("http://a.test/", 4));
        assert!(!tracker.record_throttle("http://a.test/", 7));
        assert_eq!(tracker.current_level("http://a.test/"), 4);
        assert!(tracker.is_throttled("http://a.test/"));
        assert_eq!(tracker.current_level("http://b.test/"), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_agree_on_one_level() {
        let tracker = Arc::new(ThrottleTracker::new());

        let mut handles = Vec::new();
        for level in 1..=64 {
            let tracker = tracker.clone();
            handles.push(tokio::spawn(async move {
                tracker
                    .record_throttle("http://a.test/", level)
                    .then_some(level)
            }));
        }

        let mut winners = Vec::new();
        for handle in handles {
            if let Some(level) = handle.await.unwrap() {
                winners.push(level);
            }
        }

        assert_eq!(winners.len(), 1);
        assert_eq!(tracker.current_level("http://a.test/"), winners[0]);
        assert_eq!(tracker.snapshot().len(), 1);
    }
}
