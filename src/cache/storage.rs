//! Durable string key-value stores backing the result cache snapshot.

use crate::errors::{VisionError, VisionResult};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A simple key-value string store that survives restarts.
pub trait DurableStore: Send + Sync {
    /// # Errors
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> VisionResult<Option<String>>;

    /// # Errors
    /// Returns an error if the value cannot be written, including quota exhaustion.
    fn set(&self, key: &str, value: &str) -> VisionResult<()>;

    /// # Errors
    /// Returns an error if an existing value cannot be removed.
    fn remove(&self, key: &str) -> VisionResult<()>;
}

/// In-memory store with an optional byte quota across all values.
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self { values: RwLock::new(HashMap::new()), quota_bytes: Some(quota_bytes) }
    }

    /// Stores a raw value without quota checks, e.g. to seed a corrupted snapshot.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.values.write().insert(key.to_string(), value.to_string());
    }

    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.values.read().iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> VisionResult<Option<String>> {
        Ok(self.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> VisionResult<()> {
        let mut values = self.values.write();
        if let Some(quota) = self.quota_bytes {
            let others: usize =
                values.iter().filter(|(k, _)| k.as_str() != key).map(|(k, v)| k.len() + v.len()).sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(VisionError::QuotaExceeded { needed, quota });
            }
        }
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> VisionResult<()> {
        self.values.write().remove(key);
        Ok(())
    }
}

/// Stores each key as a `<key>.json` file inside a directory.
///
/// Writes go through a temp file in the same directory and are renamed into place,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates if missing) the store directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> VisionResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .map_err(|e| VisionError::Storage(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> VisionResult<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(VisionError::Storage(format!("read {}: {e}", path.display()))),
        }
    }

    fn set(&self, key: &str, value: &str) -> VisionResult<()> {
        let path = self.path_for(key);
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| VisionError::Storage(format!("temp file in {}: {e}", self.dir.display())))?;
        tmp.write_all(value.as_bytes())
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| VisionError::Storage(format!("write {}: {e}", path.display())))?;
        tmp.persist(&path)
            .map_err(|e| VisionError::Storage(format!("replace {}: {}", path.display(), e.error)))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> VisionResult<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(VisionError::Storage(format!("remove {}: {e}", path.display()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_enforces_quota_per_total() {
        let s = MemoryStore::with_quota(10);
        assert!(s.set("k", "12345").is_ok());
        // Overwriting the same key only counts the new value.
        assert!(s.set("k", "123456789").is_ok());
        assert!(matches!(s.set("k", "1234567890"), Err(VisionError::QuotaExceeded { .. })));
        assert_eq!(s.get("k").unwrap().as_deref(), Some("123456789"));
    }

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStore::open(dir.path().join("store")).unwrap();
        assert_eq!(s.get("snap").unwrap(), None);
        s.set("snap", "[1,2]").unwrap();
        assert_eq!(s.get("snap").unwrap().as_deref(), Some("[1,2]"));
        s.remove("snap").unwrap();
        s.remove("snap").unwrap();
        assert_eq!(s.get("snap").unwrap(), None);
    }

    #[test]
    fn file_store_sanitizes_keys() {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStore::open(dir.path()).unwrap();
        let p = s.path_for("../escape/me");
        assert_eq!(p.parent(), Some(dir.path()));
    }
}
