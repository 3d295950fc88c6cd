pub mod cache;
pub mod cli;
pub mod clock;
pub mod config;
pub mod errors;
pub mod logger;
pub mod optimizer;
pub mod perf;
pub mod pipeline;
pub mod preview;
pub mod types;
pub mod utils;

pub use cache::{CacheConfig, ResultCache};
pub use errors::{VisionError, VisionResult};
pub use optimizer::{ImageOptimizer, OptimizeOptions, OutputFormat};
pub use perf::PerformanceMonitor;
pub use preview::ImagePreview;
pub use types::ImageFile;

use crate::cache::FileStore;
use crate::config::AppConfig;
use std::sync::Arc;

/// Configures logging from `config`: rolling files when a log directory is set,
/// stderr otherwise.
///
/// # Errors
/// Returns an error if the log directory or appenders cannot be created.
pub fn init(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    match &config.logging.dir {
        Some(dir) => logger::configure_logging(dir, &config.logging.level, config.logging.retention),
        None => logger::configure_console(&config.logging.level),
    }
}

/// Opens the file-backed result cache described by `config` and loads its snapshot.
///
/// # Errors
/// Returns an error if the storage directory cannot be created.
pub fn open_cache(config: &AppConfig) -> VisionResult<ResultCache> {
    let store = FileStore::open(config.storage_dir())?;
    let cache = ResultCache::new_with_config(Arc::new(store), config.cache_config());
    cache.initialize();
    Ok(cache)
}

/// Optimizer tuned by `config`.
#[must_use]
pub fn optimizer_from(config: &AppConfig) -> ImageOptimizer {
    ImageOptimizer::new()
        .with_min_optimize_bytes(config.optimizer.min_optimize_bytes)
        .with_thumbnail_quality(config.optimizer.thumbnail_quality)
}
