//! Client-side image optimization before upload: resize, recompress, thumbnails.

mod codec;
mod core;
mod metadata;
mod options;
mod reduction;
mod resize;

pub use codec::{encode, is_webp_supported, optimal_format};
pub use core::{
    DEFAULT_THUMBNAIL_QUALITY, DEFAULT_THUMBNAIL_SIZE, ImageOptimizer, MIN_OPTIMIZE_BYTES,
    OptimizedImage,
};
pub use metadata::{ImageMetadata, probe_metadata};
pub use options::{OptimizeOptions, OutputFormat};
pub use reduction::{SizeReduction, calculate_size_reduction};
pub use resize::{fit_within, target_dimensions};
