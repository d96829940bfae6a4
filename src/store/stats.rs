//! Access statistics
//!
//! Per-store session counters and the snapshot type handed to callers.
//! Nothing here is persisted; counters start from zero on every open (key
//! count starts from what is found on disk).

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of a store's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreAccessStats {
    pub hits: u64,
    pub misses: u64,
    /// Presence-filter false positives. Always 0: there is no filter.
    pub false_pos: u64,
    pub writes: u64,
    pub key_count: u64,
}

impl StoreAccessStats {
    /// hits + misses
    pub fn accesses(&self) -> u64 {
        self.hits.saturating_add(self.misses)
    }

    /// Fraction of fetches that returned a block, `None` before any fetch
    pub fn success_rate(&self) -> Option<f64> {
        match self.accesses() {
            0 => None,
            n => Some(self.hits as f64 / n as f64),
        }
    }

    /// Fetches per second over the given uptime
    pub fn access_rate(&self, uptime_secs: u64) -> Option<f64> {
        Self::per_second(self.accesses(), uptime_secs)
    }

    /// Write attempts per second over the given uptime
    pub fn write_rate(&self, uptime_secs: u64) -> Option<f64> {
        Self::per_second(self.writes, uptime_secs)
    }

    fn per_second(count: u64, uptime_secs: u64) -> Option<f64> {
        (uptime_secs > 0).then(|| count as f64 / uptime_secs as f64)
    }
}

/// Lock-free counters owned by one store instance
///
/// Each field is individually consistent; there is no cross-field atomicity,
/// so a reader may see `writes` bumped before `key_count`.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    keys: AtomicU64,
}

impl Counters {
    pub fn with_keys(keys: u64) -> Self {
        Self {
            keys: AtomicU64::new(keys),
            ..Self::default()
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    pub fn key_added(&self) {
        self.keys.fetch_add(1, Ordering::SeqCst);
    }

    /// Saturates at zero; the count may have been seeded from a racy listing
    pub fn key_removed(&self) {
        let _ = self
            .keys
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn keys(&self) -> u64 {
        self.keys.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> StoreAccessStats {
        StoreAccessStats {
            hits: self.hits(),
            misses: self.misses(),
            false_pos: 0,
            writes: self.writes(),
            key_count: self.keys(),
        }
    }
}
