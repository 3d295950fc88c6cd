//! Upload flow: optimize, consult the result cache, classify on a miss, store.

use crate::cache::ResultCache;
use crate::errors::VisionResult;
use crate::optimizer::{ImageOptimizer, OptimizeOptions, OptimizedImage};
use crate::perf::{Operation, PerformanceMonitor};
use crate::types::{ImageFile, ModelName};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

/// Request parameters forwarded to the classification backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifyOptions {
    pub model: ModelName,
    pub confidence_threshold: f32,
    pub max_results: usize,
}

impl ClassifyOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into(), confidence_threshold: 0.1, max_results: 5 }
    }
}

/// The classification backend. Results are opaque JSON stored verbatim by the cache.
pub trait Classifier: Send + Sync {
    fn classify(
        &self,
        file: &ImageFile,
        options: &ClassifyOptions,
    ) -> impl Future<Output = VisionResult<Value>> + Send;
}

#[derive(Debug, Clone)]
pub struct FlowOutcome {
    pub result: Value,
    pub from_cache: bool,
    /// `None` when optimization failed and the original was uploaded.
    pub optimization: Option<OptimizedImage>,
}

pub struct ClassificationFlow<C> {
    cache: ResultCache,
    optimizer: ImageOptimizer,
    monitor: Arc<PerformanceMonitor>,
    classifier: C,
    optimize_options: OptimizeOptions,
}

impl<C: Classifier> ClassificationFlow<C> {
    pub fn new(cache: ResultCache, optimizer: ImageOptimizer, classifier: C) -> Self {
        Self {
            cache,
            optimizer,
            monitor: Arc::new(PerformanceMonitor::new()),
            classifier,
            optimize_options: OptimizeOptions::default(),
        }
    }

    #[must_use]
    pub fn with_monitor(mut self, monitor: Arc<PerformanceMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    #[must_use]
    pub fn with_optimize_options(mut self, options: OptimizeOptions) -> Self {
        self.optimize_options = options;
        self
    }

    #[must_use]
    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    #[must_use]
    pub fn monitor(&self) -> &Arc<PerformanceMonitor> {
        &self.monitor
    }

    /// Optimizes `file` (uploading the original if that fails) and returns the
    /// classification, served from cache when available.
    ///
    /// # Errors
    /// Only classifier failures are returned; cache and optimizer problems are absorbed.
    pub async fn classify(&self, file: &ImageFile, options: &ClassifyOptions) -> VisionResult<FlowOutcome> {
        let timer = self.monitor.start_timing(Operation::Optimization);
        let optimization = match self.optimizer.optimize_image(file, &self.optimize_options).await {
            Ok(img) => {
                timer.stop(img.original_size);
                Some(img)
            }
            Err(e) => {
                log::warn!("uploading '{}' unoptimized: {e}", file.name());
                None
            }
        };
        self.classify_prepared(file, optimization, options).await
    }

    async fn classify_prepared(
        &self,
        original: &ImageFile,
        optimization: Option<OptimizedImage>,
        options: &ClassifyOptions,
    ) -> VisionResult<FlowOutcome> {
        let upload = optimization.as_ref().map_or(original, |o| &o.file);

        if let Some(result) = self.cache.get(upload, &options.model).await {
            log::debug!("cache hit for '{}' with {}", original.name(), options.model);
            return Ok(FlowOutcome { result, from_cache: true, optimization });
        }

        let size = upload.size().await.unwrap_or(0);
        let timer = self.monitor.start_timing(Operation::Classification);
        let result = self.classifier.classify(upload, options).await?;
        timer.stop(size);

        self.cache.set(upload, &options.model, result.clone()).await;
        Ok(FlowOutcome { result, from_cache: false, optimization })
    }

    /// Classifies several files. Optimization runs concurrently; classification runs
    /// in input order. Per-file classifier errors are returned in place.
    pub async fn classify_batch<F>(
        &self,
        files: &[ImageFile],
        options: &ClassifyOptions,
        on_progress: F,
    ) -> Vec<VisionResult<FlowOutcome>>
    where
        F: FnMut(usize, usize),
    {
        let optimized = self.optimizer.optimize_images(files, &self.optimize_options, on_progress).await;
        let mut out = Vec::with_capacity(files.len());
        for (original, img) in files.iter().zip(optimized) {
            out.push(self.classify_prepared(original, Some(img), options).await);
        }
        out
    }
}
