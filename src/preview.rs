//! Scoped, revocable preview URLs for selected images.
//!
//! Every URL handed out by [`ImagePreview::create`] pins the file's bytes until it
//! is released with [`ImagePreview::cleanup`] or [`ImagePreview::cleanup_all`].

use crate::errors::VisionResult;
use crate::types::ImageFile;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const URL_SCHEME: &str = "blob:visioncache/";

struct PreviewObject {
    mime_type: String,
    bytes: Arc<[u8]>,
}

#[derive(Default)]
pub struct ImagePreview {
    live: RwLock<HashMap<String, PreviewObject>>,
}

impl ImagePreview {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `file` and returns a URL referencing its bytes.
    ///
    /// # Errors
    /// Returns an error if the file content cannot be read.
    pub async fn create(&self, file: &ImageFile) -> VisionResult<String> {
        let bytes = file.read_bytes().await?;
        let url = format!("{URL_SCHEME}{}", Uuid::new_v4());
        self.live
            .write()
            .insert(url.clone(), PreviewObject { mime_type: file.mime_type().to_string(), bytes });
        log::trace!("preview created {url} for '{}'", file.name());
        Ok(url)
    }

    /// Bytes and MIME type behind a live URL.
    #[must_use]
    pub fn resolve(&self, url: &str) -> Option<(String, Arc<[u8]>)> {
        self.live.read().get(url).map(|o| (o.mime_type.clone(), Arc::clone(&o.bytes)))
    }

    /// Releases one URL. Returns false if it was not tracked.
    pub fn cleanup(&self, url: &str) -> bool {
        self.live.write().remove(url).is_some()
    }

    /// Releases every tracked URL. Returns how many were released.
    pub fn cleanup_all(&self) -> usize {
        let mut live = self.live.write();
        let n = live.len();
        live.clear();
        n
    }

    #[must_use]
    pub fn live_count(&self) -> usize {
        self.live.read().len()
    }
}

impl Drop for ImagePreview {
    fn drop(&mut self) {
        let n = self.live.get_mut().len();
        if n > 0 {
            log::debug!("releasing {n} preview URLs on drop");
        }
    }
}
