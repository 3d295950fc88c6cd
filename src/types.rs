use crate::errors::{VisionError, VisionResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Identifier of a classification model, e.g. `resnet50`.
pub type ModelName = String;

/// Extensions accepted for upload.
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Where the bytes of an [`ImageFile`] live.
#[derive(Debug, Clone)]
pub enum FileSource {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

/// An image selected for upload: a display name plus its content.
///
/// Disk-backed files are read lazily, so hashing or decoding may fail if the
/// file disappears after selection.
#[derive(Debug, Clone)]
pub struct ImageFile {
    name: String,
    mime_type: String,
    source: FileSource,
}

impl ImageFile {
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let name = name.into();
        let mime_type = mime_for_name(&name).to_string();
        let bytes: Vec<u8> = bytes.into();
        Self { name, mime_type, source: FileSource::Memory(Arc::from(bytes)) }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string();
        let mime_type = mime_for_name(&name).to_string();
        Self { name, mime_type, source: FileSource::Disk(path) }
    }

    #[must_use]
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub const fn source(&self) -> &FileSource {
        &self.source
    }

    /// Reads the full content of the file.
    ///
    /// # Errors
    /// Returns `VisionError::Io` if a disk-backed file cannot be read.
    pub async fn read_bytes(&self) -> VisionResult<Arc<[u8]>> {
        match &self.source {
            FileSource::Memory(b) => Ok(b.clone()),
            FileSource::Disk(p) => {
                let data = tokio::fs::read(p)
                    .await
                    .map_err(|e| VisionError::Io(format!("{}: {e}", p.display())))?;
                Ok(Arc::from(data))
            }
        }
    }

    /// Byte length of the content. For disk files this stats the file.
    ///
    /// # Errors
    /// Returns `VisionError::Io` if the file metadata cannot be read.
    pub async fn size(&self) -> VisionResult<u64> {
        match &self.source {
            FileSource::Memory(b) => Ok(b.len() as u64),
            FileSource::Disk(p) => Ok(tokio::fs::metadata(p).await?.len()),
        }
    }

    /// Checks the file name against [`ALLOWED_IMAGE_EXTENSIONS`].
    ///
    /// # Errors
    /// Returns `VisionError::UnsupportedFormat` when the extension is missing or not allowed.
    pub fn validate_extension(&self) -> VisionResult<()> {
        let ext = extension_of(&self.name).unwrap_or_default();
        if ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(())
        } else {
            Err(VisionError::UnsupportedFormat(format!(
                "{} (allowed: {})",
                self.name,
                ALLOWED_IMAGE_EXTENSIONS.join(", ")
            )))
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name).extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase)
}

/// Best-effort MIME type from a file name.
#[must_use]
pub fn mime_for_name(name: &str) -> &'static str {
    match extension_of(name).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Replaces (or appends) the extension of a file name.
#[must_use]
pub fn replace_extension(name: &str, ext: &str) -> String {
    let stem = Path::new(name).file_stem().and_then(|s| s.to_str()).unwrap_or(name);
    format!("{stem}.{ext}")
}
