use crate::errors::{VisionError, VisionResult};
use crate::optimizer::codec::encode;
use crate::optimizer::options::{OptimizeOptions, OutputFormat};
use crate::optimizer::resize::{fit_within, target_dimensions};
use crate::types::{ImageFile, replace_extension};
use crate::utils::num::ratio_or;
use base64::{Engine, engine::general_purpose};
use image::imageops::FilterType;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Inputs smaller than this are passed through untouched.
pub const MIN_OPTIMIZE_BYTES: u64 = 100 * 1024;
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 150;
pub const DEFAULT_THUMBNAIL_QUALITY: u8 = 70;

/// Result of one optimization.
#[derive(Debug, Clone)]
pub struct OptimizedImage {
    pub file: ImageFile,
    pub original_size: u64,
    pub optimized_size: u64,
    /// `optimized_size / original_size`.
    pub compression_ratio: f64,
    /// Final pixel width; 0 when optimization was skipped.
    pub width: u32,
    pub height: u32,
}

impl OptimizedImage {
    /// Wraps an untouched file.
    #[must_use]
    pub fn unchanged(file: ImageFile, size: u64) -> Self {
        Self { file, original_size: size, optimized_size: size, compression_ratio: 1.0, width: 0, height: 0 }
    }

    #[must_use]
    pub fn was_transformed(&self) -> bool {
        self.width != 0 && self.height != 0
    }
}

struct Transcoded {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

fn transcode(bytes: &[u8], options: &OptimizeOptions) -> VisionResult<Transcoded> {
    let img = image::load_from_memory(bytes)?;
    let (w, h) = (img.width(), img.height());
    let (tw, th) = if options.enable_resize {
        target_dimensions(w, h, options.max_width, options.max_height)
    } else {
        (w, h)
    };
    let img = if (tw, th) == (w, h) { img } else { img.resize_exact(tw, th, FilterType::Triangle) };
    let bytes = encode(&img, options.format, options.quality_percent())?;
    Ok(Transcoded { bytes, width: tw, height: th })
}

/// Resizes and recompresses images before upload. Holds only tuning constants.
#[derive(Debug, Clone, Copy)]
pub struct ImageOptimizer {
    min_optimize_bytes: u64,
    thumbnail_quality: u8,
}

impl Default for ImageOptimizer {
    fn default() -> Self {
        Self { min_optimize_bytes: MIN_OPTIMIZE_BYTES, thumbnail_quality: DEFAULT_THUMBNAIL_QUALITY }
    }
}

impl ImageOptimizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_min_optimize_bytes(mut self, bytes: u64) -> Self {
        self.min_optimize_bytes = bytes;
        self
    }

    #[must_use]
    pub const fn with_thumbnail_quality(mut self, quality: u8) -> Self {
        self.thumbnail_quality = quality;
        self
    }

    #[must_use]
    pub const fn min_optimize_bytes(&self) -> u64 {
        self.min_optimize_bytes
    }

    /// Resizes and re-encodes `file` per `options`.
    ///
    /// Small files and no-op options return the original with ratio 1.
    ///
    /// # Errors
    /// Returns an error when the file cannot be read, decoded or encoded. The caller
    /// decides whether to fall back to the original.
    pub async fn optimize_image(
        &self,
        file: &ImageFile,
        options: &OptimizeOptions,
    ) -> VisionResult<OptimizedImage> {
        let bytes = file.read_bytes().await?;
        let original_size = bytes.len() as u64;
        if original_size < self.min_optimize_bytes || options.is_noop() {
            log::debug!("skipping optimization of '{}' ({original_size} bytes)", file.name());
            return Ok(OptimizedImage::unchanged(file.clone(), original_size));
        }

        let opts = options.clone();
        let src = Arc::clone(&bytes);
        let out = tokio::task::spawn_blocking(move || transcode(&src, &opts)).await??;

        let optimized_size = out.bytes.len() as u64;
        let format: OutputFormat = options.format;
        let name = replace_extension(file.name(), format.extension());
        log::debug!(
            "optimized '{}' {}x{} {original_size} -> {optimized_size} bytes",
            file.name(),
            out.width,
            out.height
        );
        Ok(OptimizedImage {
            file: ImageFile::from_bytes(name, out.bytes).with_mime_type(format.mime_type()),
            original_size,
            optimized_size,
            compression_ratio: ratio_or(optimized_size, original_size, 1.0),
            width: out.width,
            height: out.height,
        })
    }

    /// Optimizes every file concurrently, falling back to the untouched original for
    /// any file that fails. `on_progress(completed, total)` runs as each file finishes.
    ///
    /// The returned images are in input order.
    pub async fn optimize_images<F>(
        &self,
        files: &[ImageFile],
        options: &OptimizeOptions,
        mut on_progress: F,
    ) -> Vec<OptimizedImage>
    where
        F: FnMut(usize, usize),
    {
        let total = files.len();
        let mut tasks = JoinSet::new();
        for (idx, file) in files.iter().cloned().enumerate() {
            let this = *self;
            let opts = options.clone();
            tasks.spawn(async move {
                let res = this.optimize_image(&file, &opts).await;
                (idx, res)
            });
        }

        let mut slots: Vec<Option<OptimizedImage>> = (0..total).map(|_| None).collect();
        let mut completed = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Ok(img))) => slots[idx] = Some(img),
                Ok((idx, Err(e))) => {
                    log::warn!("optimization of '{}' failed, using original: {e}", files[idx].name());
                    slots[idx] = Some(fallback(&files[idx]).await);
                }
                Err(e) => log::warn!("optimization task aborted: {e}"),
            }
            completed += 1;
            on_progress(completed, total);
        }

        let mut out = Vec::with_capacity(total);
        for (idx, slot) in slots.into_iter().enumerate() {
            match slot {
                Some(img) => out.push(img),
                None => out.push(fallback(&files[idx]).await),
            }
        }
        out
    }

    /// JPEG data URL of `file` scaled to fit a `size x size` box.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, decoded or encoded.
    pub async fn generate_thumbnail(&self, file: &ImageFile, size: u32) -> VisionResult<String> {
        if size == 0 {
            return Err(VisionError::Encode("thumbnail size must be positive".to_string()));
        }
        let bytes = file.read_bytes().await?;
        let quality = self.thumbnail_quality;
        let jpeg = tokio::task::spawn_blocking(move || -> VisionResult<Vec<u8>> {
            let img = image::load_from_memory(&bytes)?;
            let (w, h) = fit_within(img.width(), img.height(), size);
            let thumb = img.resize_exact(w, h, FilterType::Triangle);
            encode(&thumb, OutputFormat::Jpeg, quality)
        })
        .await??;
        Ok(format!("data:image/jpeg;base64,{}", general_purpose::STANDARD.encode(jpeg)))
    }
}

async fn fallback(file: &ImageFile) -> OptimizedImage {
    let size = file.size().await.unwrap_or(0);
    OptimizedImage::unchanged(file.clone(), size)
}
