//! Durable storage for the cache snapshot.
//!
//! A store holds one serialized record, like a single browser storage key.
//! The cache owns (de)serialization; stores only move strings.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::debug;

use super::dataset::SNAPSHOT_KEY;

pub trait SnapshotStore: Send + Sync {
    /// Read the stored record, `None` when nothing has been written yet.
    fn read(&self) -> Result<Option<String>>;

    /// Replace the stored record.
    fn write(&self, contents: &str) -> Result<()>;
}

/// Stores the snapshot as `<dir>/sportech-app-data.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let cache_dir = cache_dir.as_ref();
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;
        Ok(Self {
            path: cache_dir.join(format!("{}.json", SNAPSHOT_KEY)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read snapshot: {}", self.path.display()))?;
        Ok(Some(contents))
    }

    fn write(&self, contents: &str) -> Result<()> {
        // Write then rename so a crash never leaves a half-written snapshot.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("Failed to write snapshot: {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace snapshot: {}", self.path.display()))?;
        debug!(path = %self.path.display(), bytes = contents.len(), "Snapshot written");
        Ok(())
    }
}

/// Keeps the snapshot in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    contents: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing record, as if written by an earlier run.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(Some(contents.into())),
        }
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self) -> Result<Option<String>> {
        let guard = self
            .contents
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn write(&self, contents: &str) -> Result<()> {
        let mut guard = self
            .contents
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store lock poisoned"))?;
        *guard = Some(contents.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested")).unwrap();
        assert!(store.read().unwrap().is_none());

        store.write(r#"{"version":1}"#).unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some(r#"{"version":1}"#));
        assert!(store.path().ends_with("sportech-app-data.json"));

        store.write("{}").unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("{}"));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.read().unwrap().is_none());
        store.write("abc").unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("abc"));

        let seeded = MemoryStore::with_contents("seed");
        assert_eq!(seeded.read().unwrap().as_deref(), Some("seed"));
    }
}
