use std::time::Duration;

/// Storage key holding the JSON snapshot of all entries.
pub const DEFAULT_STORAGE_KEY: &str = "image_classification_cache";

/// Configuration for the result cache.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Entry count above which a cleanup pass runs.
    pub max_entries: usize,
    /// Free slots left after oldest-first trimming (`max_entries - reserve` are kept).
    pub reserve: usize,
    pub default_ttl: Duration,
    pub sweep_interval: Duration,
    pub storage_key: String,
}

impl CacheConfig {
    /// Number of entries kept by the oldest-first phase of cleanup.
    #[must_use]
    pub fn trim_target(&self) -> usize {
        self.max_entries.saturating_sub(self.reserve)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            reserve: 100,
            default_ttl: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(5 * 60),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}
