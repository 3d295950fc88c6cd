use crate::cache::config::CacheConfig;
use crate::cache::entry::CacheEntry;
use crate::cache::key::{cache_key, content_hash};
use crate::cache::maintenance::MaintenanceHandle;
use crate::cache::metrics::{CacheMetrics, CacheMetricsSnapshot, CacheStats};
use crate::cache::policy::{CleanupReport, cleanup};
use crate::cache::size::approximate_snapshot_size;
use crate::cache::storage::DurableStore;
use crate::clock::{SystemTimeProvider, TimeProvider, duration_to_millis};
use crate::errors::VisionResult;
use crate::types::ImageFile;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

pub(crate) struct CacheInner {
    entries: RwLock<HashMap<String, CacheEntry>>,
    config: CacheConfig,
    metrics: CacheMetrics,
    store: Arc<dyn DurableStore>,
    clock: Arc<dyn TimeProvider>,
    maintenance: Mutex<Option<MaintenanceHandle>>,
}

/// Content-addressed, TTL-based cache of classification results.
///
/// Entries are keyed by `sha256(file bytes) + "_" + model` and persisted as one
/// JSON snapshot in a [`DurableStore`]. Storage and hashing failures are logged and
/// absorbed: at worst the cache behaves as if empty.
#[derive(Clone)]
pub struct ResultCache {
    inner: Arc<CacheInner>,
}

impl ResultCache {
    /// Creates a cache with default configuration. Call [`initialize`](Self::initialize)
    /// to load persisted entries.
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self::new_with_config(store, CacheConfig::default())
    }

    pub fn new_with_config(store: Arc<dyn DurableStore>, config: CacheConfig) -> Self {
        Self::new_with_parts(store, config, Arc::new(SystemTimeProvider))
    }

    pub fn new_with_parts(
        store: Arc<dyn DurableStore>,
        config: CacheConfig,
        clock: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                entries: RwLock::new(HashMap::new()),
                config,
                metrics: CacheMetrics::default(),
                store,
                clock,
                maintenance: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn from_inner(inner: Arc<CacheInner>) -> Self {
        Self { inner }
    }

    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn metrics_snapshot(&self) -> CacheMetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    fn now(&self) -> i64 {
        self.inner.clock.now_millis()
    }

    /// Loads the persisted snapshot, dropping entries that have already expired.
    /// Returns the number of entries loaded. Safe to call repeatedly.
    pub fn initialize(&self) -> usize {
        let key = &self.inner.config.storage_key;
        let loaded: Vec<CacheEntry> = match self.inner.store.get(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(v) => v,
                Err(e) => {
                    log::warn!("discarding unreadable cache snapshot '{key}': {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("failed to read cache snapshot '{key}': {e}");
                Vec::new()
            }
        };
        let now = self.now();
        let total = loaded.len();
        let live: HashMap<String, CacheEntry> = loaded
            .into_iter()
            .filter(|e| !e.is_expired_at(now))
            .map(|e| (e.id.clone(), e))
            .collect();
        let count = live.len();
        *self.inner.entries.write() = live;
        log::info!("result cache initialized: {count} entries ({} expired dropped)", total - count);
        count
    }

    /// Computes the cache key for `file` under `model`.
    ///
    /// # Errors
    /// Returns an error if the file content cannot be read.
    pub async fn key_for(&self, file: &ImageFile, model: &str) -> VisionResult<String> {
        let bytes = file.read_bytes().await?;
        Ok(cache_key(&content_hash(&bytes), model))
    }

    async fn lookup_key(&self, file: &ImageFile, model: &str) -> Option<String> {
        match self.key_for(file, model).await {
            Ok(k) => Some(k),
            Err(e) => {
                self.inner.metrics.hash_failures.fetch_add(1, Ordering::Relaxed);
                log::warn!("cache lookup for '{}' treated as miss: {e}", file.name());
                None
            }
        }
    }

    /// Looks up `key`, evicting it if expired. Does not touch hit/miss counters.
    fn probe(&self, key: &str) -> Option<Value> {
        let now = self.now();
        let expired = {
            let mut entries = self.inner.entries.write();
            match entries.get(key) {
                Some(e) if !e.is_expired_at(now) => return Some(e.result.clone()),
                Some(_) => {
                    entries.remove(key);
                    true
                }
                None => false,
            }
        };
        if expired {
            self.inner.metrics.ttl_evictions.fetch_add(1, Ordering::Relaxed);
            log::debug!("evicted expired entry {key}");
            self.persist();
        }
        None
    }

    /// True when an unexpired entry exists for `file` under `model`.
    pub async fn has(&self, file: &ImageFile, model: &str) -> bool {
        match self.lookup_key(file, model).await {
            Some(key) => self.probe(&key).is_some(),
            None => false,
        }
    }

    /// Returns the cached result for `file` under `model`, tallying a hit or miss.
    pub async fn get(&self, file: &ImageFile, model: &str) -> Option<Value> {
        let found = match self.lookup_key(file, model).await {
            Some(key) => self.probe(&key),
            None => None,
        };
        let counter = if found.is_some() { &self.inner.metrics.hits } else { &self.inner.metrics.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Stores `result` with the configured default TTL.
    pub async fn set(&self, file: &ImageFile, model: &str, result: Value) {
        self.set_with_ttl(file, model, result, self.inner.config.default_ttl).await;
    }

    /// Stores `result` for `file` under `model`, expiring after `ttl`.
    ///
    /// Overwrites any existing entry for the same content and model.
    pub async fn set_with_ttl(&self, file: &ImageFile, model: &str, result: Value, ttl: Duration) {
        let bytes = match file.read_bytes().await {
            Ok(b) => b,
            Err(e) => {
                self.inner.metrics.hash_failures.fetch_add(1, Ordering::Relaxed);
                log::warn!("dropping cache write for '{}': {e}", file.name());
                return;
            }
        };
        let file_hash = content_hash(&bytes);
        let now = self.now();
        let entry = CacheEntry {
            id: cache_key(&file_hash, model),
            filename: file.name().to_string(),
            file_hash,
            result,
            timestamp: now,
            model_used: model.to_string(),
            expires_at: now.saturating_add(duration_to_millis(ttl)),
        };
        {
            let cfg = &self.inner.config;
            let mut entries = self.inner.entries.write();
            entries.insert(entry.id.clone(), entry);
            self.inner.metrics.inserts.fetch_add(1, Ordering::Relaxed);
            if entries.len() > cfg.max_entries {
                let report =
                    cleanup(&mut entries, now, cfg.max_entries, cfg.trim_target(), &self.inner.metrics);
                log::debug!("cleanup after insert: {report:?}");
            }
        }
        self.persist_with_retry();
    }

    /// Empties the cache, resets hit/miss counters and deletes the snapshot.
    pub fn clear(&self) {
        let removed = {
            let mut entries = self.inner.entries.write();
            let n = entries.len();
            entries.clear();
            n
        };
        self.inner.metrics.removes.fetch_add(removed as u64, Ordering::Relaxed);
        self.inner.metrics.reset_lookups();
        if let Err(e) = self.inner.store.remove(&self.inner.config.storage_key) {
            log::warn!("failed to remove cache snapshot: {e}");
        }
        log::info!("result cache cleared ({removed} entries)");
    }

    /// Removes every entry produced by `model`. Returns the number removed.
    pub fn clear_model(&self, model: &str) -> usize {
        let removed = {
            let mut entries = self.inner.entries.write();
            let before = entries.len();
            entries.retain(|_, e| e.model_used != model);
            before - entries.len()
        };
        self.inner.metrics.removes.fetch_add(removed as u64, Ordering::Relaxed);
        self.persist();
        log::info!("cleared {removed} cached results for model '{model}'");
        removed
    }

    /// Unexpired entries for `model`, most recent first.
    #[must_use]
    pub fn model_results(&self, model: &str) -> Vec<CacheEntry> {
        let now = self.now();
        let mut out: Vec<CacheEntry> = self
            .inner
            .entries
            .read()
            .values()
            .filter(|e| e.model_used == model && !e.is_expired_at(now))
            .cloned()
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then_with(|| a.id.cmp(&b.id)));
        out
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let now = self.now();
        let entries = self.inner.entries.read();
        let oldest = entries.values().map(|e| e.timestamp).min().unwrap_or(now);
        let newest = entries.values().map(|e| e.timestamp).max().unwrap_or(now);
        CacheStats {
            total_entries: entries.len(),
            hit_rate: self.inner.metrics.snapshot().hit_rate(),
            memory_usage: approximate_snapshot_size(entries.values()),
            oldest_entry: oldest,
            newest_entry: newest,
        }
    }

    /// Sweeps expired entries; when any are found runs the full cleanup and persists.
    pub fn run_maintenance(&self) -> CleanupReport {
        let now = self.now();
        let any_expired = self.inner.entries.read().values().any(|e| e.is_expired_at(now));
        if !any_expired {
            return CleanupReport { remaining: self.len(), ..CleanupReport::default() };
        }
        let report = {
            let cfg = &self.inner.config;
            let mut entries = self.inner.entries.write();
            cleanup(&mut entries, now, cfg.max_entries, cfg.trim_target(), &self.inner.metrics)
        };
        self.persist();
        log::info!(
            target: "visioncache::metrics",
            "cache maintenance: expired={} trimmed={} remaining={}",
            report.expired_removed,
            report.trimmed,
            report.remaining
        );
        report
    }

    /// Starts the periodic sweep at the configured interval. No-op if already running.
    ///
    /// # Errors
    /// Returns an error if the sweep thread cannot be spawned.
    pub fn start_maintenance(&self) -> VisionResult<()> {
        let mut slot = self.inner.maintenance.lock();
        if slot.is_none() {
            let handle = MaintenanceHandle::spawn(
                Arc::downgrade(&self.inner),
                self.inner.config.sweep_interval,
            )?;
            *slot = Some(handle);
            log::info!("cache sweep started every {:?}", self.inner.config.sweep_interval);
        }
        Ok(())
    }

    #[must_use]
    pub fn maintenance_running(&self) -> bool {
        self.inner.maintenance.lock().is_some()
    }

    /// Stops the periodic sweep. Entries stay in memory and in storage.
    pub fn dispose(&self) {
        let handle = self.inner.maintenance.lock().take();
        if let Some(h) = handle {
            h.stop();
            log::info!("cache sweep stopped");
        }
    }

    fn snapshot_json(&self) -> Option<String> {
        let entries = self.inner.entries.read();
        let items: Vec<&CacheEntry> = entries.values().collect();
        match serde_json::to_string(&items) {
            Ok(s) => Some(s),
            Err(e) => {
                log::warn!("failed to serialize cache snapshot: {e}");
                None
            }
        }
    }

    fn write_snapshot(&self) -> VisionResult<()> {
        match self.snapshot_json() {
            Some(json) => self.inner.store.set(&self.inner.config.storage_key, &json),
            None => Ok(()),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.write_snapshot() {
            self.inner.metrics.persist_failures.fetch_add(1, Ordering::Relaxed);
            log::warn!("cache snapshot not persisted, continuing in memory: {e}");
        }
    }

    /// Persists; on failure runs the regular cleanup pass and tries exactly once more.
    /// Entries stay in memory whatever the outcome.
    fn persist_with_retry(&self) {
        let Err(first) = self.write_snapshot() else { return };
        self.inner.metrics.persist_failures.fetch_add(1, Ordering::Relaxed);
        log::warn!("cache snapshot write failed, cleaning up before retry: {first}");
        {
            let cfg = &self.inner.config;
            let now = self.now();
            let mut entries = self.inner.entries.write();
            let report =
                cleanup(&mut entries, now, cfg.max_entries, cfg.trim_target(), &self.inner.metrics);
            log::debug!("cleanup before retry: {report:?}");
        }
        if let Err(e) = self.write_snapshot() {
            self.inner.metrics.persist_failures.fetch_add(1, Ordering::Relaxed);
            log::warn!("cache snapshot retry failed, continuing in memory: {e}");
        }
    }
}
