mod config;
mod core;
mod entry;
mod key;
mod maintenance;
mod metrics;
mod policy;
mod size;
pub mod storage;

pub use config::{CacheConfig, DEFAULT_STORAGE_KEY};
pub use core::ResultCache;
pub use entry::CacheEntry;
pub use key::{cache_key, content_hash};
pub use metrics::{CacheMetrics, CacheMetricsSnapshot, CacheStats};
pub use policy::CleanupReport;
pub use storage::{DurableStore, FileStore, MemoryStore};
