//! Encoding helpers and format capability probes.

use crate::errors::{VisionError, VisionResult};
use crate::optimizer::options::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageFormat};

/// True when this build can encode WebP.
#[must_use]
pub fn is_webp_supported() -> bool {
    ImageFormat::WebP.writing_enabled()
}

/// Preferred upload encoding: WebP where available, JPEG otherwise.
#[must_use]
pub fn optimal_format() -> OutputFormat {
    if is_webp_supported() { OutputFormat::Webp } else { OutputFormat::Jpeg }
}

/// Encodes `img` as `format`. `quality` (1..=100) applies to JPEG only;
/// PNG and WebP output is lossless.
///
/// # Errors
/// Returns an error if the format cannot be written by this build or the encoder fails.
pub fn encode(img: &DynamicImage, format: OutputFormat, quality: u8) -> VisionResult<Vec<u8>> {
    if !format.image_format().writing_enabled() {
        return Err(VisionError::UnsupportedFormat(format!("cannot encode {format:?}")));
    }
    let mut buf = Vec::new();
    match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
            rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100)))?;
        }
        OutputFormat::Png => {
            let enc =
                PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
            img.write_with_encoder(enc)?;
        }
        OutputFormat::Webp => {
            let rgba = DynamicImage::ImageRgba8(img.to_rgba8());
            rgba.write_with_encoder(WebPEncoder::new_lossless(&mut buf))?;
        }
    }
    if buf.is_empty() {
        return Err(VisionError::Encode(format!("{format:?} encoder produced no data")));
    }
    Ok(buf)
}
