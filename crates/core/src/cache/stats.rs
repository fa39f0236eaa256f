//! Store statistics and metrics tracking

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Snapshot of store counters and byte usage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    /// Live entries
    pub entries: usize,
    /// Bytes charged by live entries
    pub size_bytes: usize,
    /// Byte budget
    pub max_size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries removed past their TTL: by a plain read, by capacity
    /// enforcement, or by the sweep once the grace window has also passed
    pub expirations: u64,
}

impl StoreStats {
    /// hits / (hits + misses), 0 when nothing was read yet
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of lookups (hits + misses)
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }

    /// Fraction of the byte budget in use
    pub fn memory_usage(&self) -> f64 {
        if self.max_size_bytes == 0 {
            0.0
        } else {
            self.size_bytes as f64 / self.max_size_bytes as f64
        }
    }
}

/// Lock-free counters updated on the hot path
#[derive(Debug, Default)]
pub(crate) struct MetricsCollector {
    hits: AtomicU64,
    misses: AtomicU64,
    inserts: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl MetricsCollector {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: u64) {
        if count > 0 {
            self.evictions.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub(crate) fn record_expirations(&self, count: u64) {
        if count > 0 {
            self.expirations.fetch_add(count, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self, entries: usize, size_bytes: usize, max_size_bytes: usize) -> StoreStats {
        StoreStats {
            entries,
            size_bytes,
            max_size_bytes,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn reset(&self) {
        for counter in [&self.hits, &self.misses, &self.inserts, &self.evictions, &self.expirations] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
