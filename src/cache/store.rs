//! Disk Store Module
//!
//! Durable key/value storage: one file per cache key under a fixed root.
//! Nothing is held in memory between calls; every read goes to disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use crate::cache::CacheKey;
use crate::error::StoreError;

// == Disk Store ==
/// Filesystem-backed record storage.
#[derive(Debug, Clone)]
pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    // == Constructor ==
    /// Opens a store rooted at `root`, creating the directory if needed.
    pub async fn new(root: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .await
            .map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(key.as_str())
    }

    // == Get ==
    /// Reads the bytes stored for `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored; absence is not an error.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key);
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    // == Put ==
    /// Writes `bytes` for `key`, replacing any existing value.
    ///
    /// Data goes to a uniquely named temp file which is synced and then
    /// renamed over the target, so readers see either the old or the new
    /// value and never a partial one.
    #[instrument(skip(self, bytes), fields(key = %key, size = bytes.len()))]
    pub async fn put(&self, key: &CacheKey, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key);
        let temp_path = self
            .root
            .join(format!("{}.tmp.{}", key.as_str(), Uuid::new_v4()));

        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(temp_path, e));
        }

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(StoreError::io(path, e));
        }
        Ok(())
    }

    // == Delete ==
    /// Removes the value for `key` if present.
    ///
    /// Returns whether a value was removed. Deleting an absent key succeeds.
    #[instrument(skip(self), fields(key = %key))]
    pub async fn delete(&self, key: &CacheKey) -> Result<bool, StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    // == Keys ==
    /// Lists every key currently stored. Temp files and foreign names are skipped.
    pub async fn keys(&self) -> Result<Vec<CacheKey>, StoreError> {
        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| StoreError::io(&self.root, e))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StoreError::io(&self.root, e))?
        {
            if let Some(key) = entry.file_name().to_str().and_then(CacheKey::from_file_name) {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (tempfile::TempDir, DiskStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::new(dir.path().join("cache")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_new_creates_root() {
        let (_dir, store) = test_store().await;
        assert!(store.root().is_dir());
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::for_url("https://example.org/missing");
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::for_url("https://example.org/a");

        store.put(&key, b"first").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some(&b"first"[..]));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::for_url("https://example.org/a");

        store.put(&key, b"first").await.unwrap();
        store.put(&key, b"second").await.unwrap();

        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some(&b"second"[..]));
        assert_eq!(store.keys().await.unwrap(), vec![key]);
    }

    #[tokio::test]
    async fn test_put_leaves_no_temp_files() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::for_url("https://example.org/a");
        store.put(&key, b"value").await.unwrap();

        let mut names = Vec::new();
        let mut entries = fs::read_dir(store.root()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        assert_eq!(names, vec![key.as_str().to_string()]);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::for_url("https://example.org/a");

        store.put(&key, b"value").await.unwrap();
        assert!(store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
        assert!(!store.delete(&key).await.unwrap());
        assert!(store.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_keys_skips_foreign_files() {
        let (_dir, store) = test_store().await;
        let key = CacheKey::for_url("https://example.org/a");
        store.put(&key, b"value").await.unwrap();
        fs::write(store.root().join("notes.txt"), b"hello").await.unwrap();
        fs::write(store.root().join(format!("{}.tmp.x", key)), b"partial")
            .await
            .unwrap();

        assert_eq!(store.keys().await.unwrap(), vec![key]);
    }
}
