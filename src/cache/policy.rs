use crate::cache::entry::CacheEntry;
use crate::cache::metrics::CacheMetrics;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::Ordering;

/// Outcome of one cleanup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub expired_removed: usize,
    pub trimmed: usize,
    pub remaining: usize,
}

impl CleanupReport {
    #[must_use]
    pub const fn removed(&self) -> usize {
        self.expired_removed + self.trimmed
    }
}

/// Removes entries with `expires_at <= now`. Returns number evicted.
pub fn purge_expired(
    entries: &mut HashMap<String, CacheEntry>,
    now: i64,
    metrics: &CacheMetrics,
) -> usize {
    let before = entries.len();
    entries.retain(|_, e| !e.is_expired_at(now));
    let count = before - entries.len();
    if count > 0 {
        metrics.ttl_evictions.fetch_add(count as u64, Ordering::Relaxed);
        crate::devlog!("{{\"bench\":\"cache\",\"op\":\"ttl_purge\",\"evicted\":{count}}}");
    }
    count
}

/// Keeps only the `keep` most recent entries by `timestamp`. Returns number evicted.
pub fn trim_oldest(
    entries: &mut HashMap<String, CacheEntry>,
    keep: usize,
    metrics: &CacheMetrics,
) -> usize {
    if entries.len() <= keep {
        return 0;
    }
    let mut by_age: Vec<(i64, String)> =
        entries.iter().map(|(k, e)| (e.timestamp, k.clone())).collect();
    // Ties broken by key so the victim set is deterministic.
    by_age.sort();
    let excess = entries.len() - keep;
    for (_, key) in by_age.into_iter().take(excess) {
        entries.remove(&key);
    }
    metrics.trim_evictions.fetch_add(excess as u64, Ordering::Relaxed);
    crate::devlog!("{{\"bench\":\"cache\",\"op\":\"trim_oldest\",\"evicted\":{excess},\"kept\":{keep}}}");
    excess
}

/// Two-phase cleanup: expired entries first, then oldest-first down to `trim_target`
/// when the count still exceeds `max_entries`.
pub fn cleanup(
    entries: &mut HashMap<String, CacheEntry>,
    now: i64,
    max_entries: usize,
    trim_target: usize,
    metrics: &CacheMetrics,
) -> CleanupReport {
    let expired_removed = purge_expired(entries, now, metrics);
    let trimmed =
        if entries.len() > max_entries { trim_oldest(entries, trim_target, metrics) } else { 0 };
    CleanupReport { expired_removed, trimmed, remaining: entries.len() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, timestamp: i64, expires_at: i64) -> CacheEntry {
        CacheEntry {
            id: id.to_string(),
            filename: format!("{id}.png"),
            file_hash: id.to_string(),
            result: json!({"label": id}),
            timestamp,
            model_used: "m".to_string(),
            expires_at,
        }
    }

    fn map(items: Vec<CacheEntry>) -> HashMap<String, CacheEntry> {
        items.into_iter().map(|e| (e.id.clone(), e)).collect()
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let m = CacheMetrics::default();
        let mut entries = map(vec![entry("a", 0, 100), entry("b", 0, 101)]);
        assert_eq!(purge_expired(&mut entries, 100, &m), 1);
        assert!(entries.contains_key("b"));
    }

    #[test]
    fn cleanup_drops_expired_before_trimming() {
        let m = CacheMetrics::default();
        let mut entries = map(vec![
            entry("old_live", 1, 10_000),
            entry("expired", 2, 5),
            entry("mid", 3, 10_000),
            entry("new", 4, 10_000),
        ]);
        // max 2, keep 1: the expired one goes first, then the two oldest live ones.
        let report = cleanup(&mut entries, 50, 2, 1, &m);
        assert_eq!(report, CleanupReport { expired_removed: 1, trimmed: 2, remaining: 1 });
        assert!(entries.contains_key("new"));
    }

    #[test]
    fn no_trim_when_within_bound() {
        let m = CacheMetrics::default();
        let mut entries = map(vec![entry("a", 1, 100), entry("b", 2, 100)]);
        let report = cleanup(&mut entries, 0, 2, 0, &m);
        assert_eq!(report.removed(), 0);
        assert_eq!(m.snapshot().trim_evictions, 0);
    }

    #[test]
    fn trim_emits_devlog() {
        let _g = crate::utils::devlog::enable_thread_sink();
        let m = CacheMetrics::default();
        let mut entries = map(vec![entry("a", 1, 100), entry("b", 2, 100), entry("c", 3, 100)]);
        assert_eq!(trim_oldest(&mut entries, 1, &m), 2);
        let logs = crate::utils::devlog::drain();
        assert!(logs.iter().any(|l| l.contains("trim_oldest") && l.contains("\"evicted\":2")));
    }
}
