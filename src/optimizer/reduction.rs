use crate::optimizer::core::OptimizedImage;
use serde::Serialize;

/// Aggregate byte savings across a batch of optimized images.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeReduction {
    pub original_total: u64,
    pub optimized_total: u64,
    /// Negative when optimization grew the payload.
    pub reduction_bytes: i64,
    pub reduction_percentage: f64,
}

#[must_use]
pub fn calculate_size_reduction(images: &[OptimizedImage]) -> SizeReduction {
    let original_total: u64 = images.iter().map(|i| i.original_size).sum();
    let optimized_total: u64 = images.iter().map(|i| i.optimized_size).sum();
    let reduction_bytes = original_total as i64 - optimized_total as i64;
    let reduction_percentage = if original_total == 0 {
        0.0
    } else {
        reduction_bytes as f64 / original_total as f64 * 100.0
    };
    SizeReduction { original_total, optimized_total, reduction_bytes, reduction_percentage }
}
