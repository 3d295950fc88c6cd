use crate::errors::VisionError;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Encoding used for optimized uploads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    #[must_use]
    pub const fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Webp => ImageFormat::WebP,
        }
    }
}

impl FromStr for OutputFormat {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            other => Err(VisionError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Knobs for `ImageOptimizer::optimize_image`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    /// Encoder quality in `0.0..=1.0`.
    pub quality: f32,
    pub format: OutputFormat,
    pub enable_resize: bool,
    pub enable_compression: bool,
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        Self {
            max_width: 1024,
            max_height: 1024,
            quality: 0.85,
            format: OutputFormat::Jpeg,
            enable_resize: true,
            enable_compression: true,
        }
    }
}

impl OptimizeOptions {
    /// Encoder quality on the 1..=100 scale; full quality when compression is off.
    #[must_use]
    pub fn quality_percent(&self) -> u8 {
        if !self.enable_compression {
            return 100;
        }
        let q = f64::from(self.quality.clamp(0.0, 1.0)) * 100.0;
        crate::utils::num::f64_to_u32_clamped(q, 1, 100) as u8
    }

    /// True when neither resizing nor recompression is requested.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        !self.enable_resize && !self.enable_compression
    }
}
