//! Cache counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub puts: u64,
    /// Puts dropped because their partition had been invalidated.
    pub stale_puts: u64,
    pub partition_invalidations: u64,
    pub full_invalidations: u64,
    pub partitions: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    puts: AtomicU64,
    stale_puts: AtomicU64,
    partition_invalidations: AtomicU64,
    full_invalidations: AtomicU64,
}

impl Counters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stale_put(&self) {
        self.stale_puts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn partition_invalidated(&self) {
        self.partition_invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn fully_invalidated(&self) {
        self.full_invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self, partitions: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            stale_puts: self.stale_puts.load(Ordering::Relaxed),
            partition_invalidations: self.partition_invalidations.load(Ordering::Relaxed),
            full_invalidations: self.full_invalidations.load(Ordering::Relaxed),
            partitions,
        }
    }
}
