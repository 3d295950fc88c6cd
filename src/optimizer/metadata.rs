use crate::errors::VisionResult;
use crate::types::ImageFile;
use image::ImageReader;
use serde::Serialize;
use std::io::Cursor;

/// Header-level facts about an image, read without a full decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMetadata {
    pub filename: String,
    pub format: String,
    pub width: u32,
    pub height: u32,
    pub size_bytes: u64,
}

/// Reads format and dimensions of `file`.
///
/// # Errors
/// Returns an error if the content is unreadable or not a recognized image.
pub async fn probe_metadata(file: &ImageFile) -> VisionResult<ImageMetadata> {
    let bytes = file.read_bytes().await?;
    let format = image::guess_format(&bytes)?;
    let (width, height) =
        ImageReader::with_format(Cursor::new(&bytes[..]), format).into_dimensions()?;
    Ok(ImageMetadata {
        filename: file.name().to_string(),
        format: format!("{format:?}").to_ascii_lowercase(),
        width,
        height,
        size_bytes: bytes.len() as u64,
    })
}
