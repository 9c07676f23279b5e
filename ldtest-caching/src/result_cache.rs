//! TTL cache of per-target load test results

use crate::errors::{CacheError, CacheResult};
use dashmap::DashMap;
use ldtest_core::{Fingerprint, Target, TargetStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Upper bound for TTLs and sweep periods, roughly thirty years
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// `now + ttl`, clamped so configured durations never overflow an `Instant`
fn expiry_after(now: Instant, ttl: Duration) -> Instant {
    now + ttl.min(FAR_FUTURE)
}

/// Cached statistics for one target
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub stats: TargetStats,
    pub fingerprint: Fingerprint,
    pub expires_at: Instant,
}

impl CacheEntry {
    fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    fn is_stale(&self, fingerprint: &Fingerprint, now: Instant) -> bool {
        self.fingerprint != *fingerprint || self.is_expired_at(now)
    }
}

/// Concurrent TTL cache keyed by target.
///
/// Backed by a sharded map, so lookups for different targets never contend on a
/// single lock. Evictions re-check their predicate under the shard lock and
/// cannot remove an entry written concurrently by [`ResultCache::put`].
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: DashMap<Target, CacheEntry>,
    shutdown: CancellationToken,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up `target`. An entry stored under another fingerprint, or past its
    /// expiry, is a miss and is evicted.
    pub fn get(&self, target: &Target, fingerprint: &Fingerprint) -> Option<TargetStats> {
        let now = Instant::now();

        let hit = match self.entries.get(target) {
            Some(entry) => (!entry.is_stale(fingerprint, now)).then_some(entry.stats),
            None => return None,
        };

        if hit.is_none()
            && self
                .entries
                .remove_if(target, |_, entry| entry.is_stale(fingerprint, now))
                .is_some()
        {
            debug!("Evicted stale cache entry for {}", target);
        }

        hit
    }

    /// Store `stats` for `target`, replacing any previous entry
    pub fn put(&self, target: Target, fingerprint: Fingerprint, stats: TargetStats, ttl: Duration) {
        let entry = CacheEntry {
            stats,
            fingerprint,
            expires_at: expiry_after(Instant::now(), ttl),
        };
        self.entries.insert(target, entry);
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut evicted = 0;

        self.entries.retain(|_, entry| {
            let keep = !entry.is_expired_at(now);
            if !keep {
                evicted += 1;
            }
            keep
        });

        evicted
    }

    /// Start the background sweep. It runs every `interval` until [`ResultCache::close`]
    /// is called or the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> CacheResult<JoinHandle<()>> {
        if interval.is_zero() {
            return Err(CacheError::InvalidConfiguration(
                "sweep interval must be positive".to_string(),
            ));
        }
        if self.is_closed() {
            return Err(CacheError::Closed);
        }

        let cache = Arc::downgrade(self);
        let shutdown = self.shutdown.clone();

        Ok(tokio::spawn(async move {
            let period = interval.min(FAR_FUTURE);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else { break };
                        let evicted = cache.sweep();
                        if evicted > 0 {
                            debug!("Cache sweep evicted {} entries", evicted);
                        }
                    }
                }
            }

            debug!("Cache sweeper stopped");
        }))
    }

    /// Stop the background sweep. Safe to call more than once and from several tasks.
    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
