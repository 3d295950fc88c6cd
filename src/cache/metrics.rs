use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for observing cache behavior.
#[derive(Default)]
pub struct CacheMetrics {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub inserts: AtomicU64,
    pub removes: AtomicU64,
    pub ttl_evictions: AtomicU64,
    pub trim_evictions: AtomicU64,
    pub persist_failures: AtomicU64,
    pub hash_failures: AtomicU64,
}

impl CacheMetrics {
    pub fn snapshot(&self) -> CacheMetricsSnapshot {
        CacheMetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            ttl_evictions: self.ttl_evictions.load(Ordering::Relaxed),
            trim_evictions: self.trim_evictions.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            hash_failures: self.hash_failures.load(Ordering::Relaxed),
        }
    }

    /// Zeroes the lookup counters; eviction and failure counters are kept.
    pub fn reset_lookups(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheMetricsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub inserts: u64,
    pub removes: u64,
    pub ttl_evictions: u64,
    pub trim_evictions: u64,
    pub persist_failures: u64,
    pub hash_failures: u64,
}

impl CacheMetricsSnapshot {
    /// `hits / (hits + misses)`, or 0 before any lookup.
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 { 0.0 } else { self.hits as f64 / total as f64 }
    }
}

/// Summary returned by `ResultCache::stats`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub hit_rate: f64,
    /// Approximate serialized size of the entry set in bytes.
    pub memory_usage: usize,
    pub oldest_entry: i64,
    pub newest_entry: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_rate_is_zero_without_lookups() {
        let m = CacheMetrics::default();
        assert_eq!(m.snapshot().hit_rate(), 0.0);
    }

    #[test]
    fn reset_keeps_eviction_counters() {
        let m = CacheMetrics::default();
        m.hits.fetch_add(3, Ordering::Relaxed);
        m.misses.fetch_add(1, Ordering::Relaxed);
        m.ttl_evictions.fetch_add(2, Ordering::Relaxed);
        assert!((m.snapshot().hit_rate() - 0.75).abs() < f64::EPSILON);
        m.reset_lookups();
        let s = m.snapshot();
        assert_eq!((s.hits, s.misses, s.ttl_evictions), (0, 0, 2));
    }
}
