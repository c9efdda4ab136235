//! Time-bounded in-memory cache of scrape results.
//!
//! The cache is an injected component rather than a process global: the
//! service takes any [`ResultCache`], so tests can use a short TTL or their own
//! double and every server instance owns its own store.
//!
//! Entries expire lazily: a lookup that finds a stale entry removes it and
//! reports a miss. [`ResultCache::purge_expired`] sweeps everything stale and
//! is run periodically by the server to bound memory.
//!
//! Concurrent misses on the same key are not collapsed; each one scrapes.

use crate::models::{CacheKey, ResultSet};
use dashmap::DashMap;
use std::time::{Duration, Instant};
use tracing::debug;

pub trait ResultCache: Send + Sync {
    /// A copy of the fresh entry for `key`, if any.
    fn get(&self, key: &CacheKey) -> Option<ResultSet>;
    /// Store `value` under `key`, stamped with the current time.
    fn set(&self, key: CacheKey, value: ResultSet);
    /// Drop every expired entry, returning how many were removed.
    fn purge_expired(&self) -> usize;
    /// Number of stored entries, expired or not.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
    fn ttl(&self) -> Duration;
}

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: ResultSet,
    stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) < ttl
    }
}

/// [`ResultCache`] on a sharded concurrent map. Each operation holds a shard
/// lock only for the map access itself.
#[derive(Debug)]
pub struct TtlCache {
    entries: DashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }
}

impl ResultCache for TtlCache {
    fn get(&self, key: &CacheKey) -> Option<ResultSet> {
        let now = Instant::now();
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now, self.ttl) => return Some(entry.payload.clone()),
            Some(_) => {}
            None => return None,
        }
        // shard guard released above; drop the stale entry unless a writer
        // replaced it meanwhile
        let ttl = self.ttl;
        if self
            .entries
            .remove_if(key, |_, entry| !entry.is_fresh(now, ttl))
            .is_some()
        {
            debug!(%key, "Evicted expired cache entry");
        }
        None
    }

    fn set(&self, key: CacheKey, value: ResultSet) {
        self.entries.insert(
            key,
            CacheEntry {
                payload: value,
                stored_at: Instant::now(),
            },
        );
    }

    fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_fresh(now, self.ttl));
        before.saturating_sub(self.entries.len())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn ttl(&self) -> Duration {
        self.ttl
    }
}
