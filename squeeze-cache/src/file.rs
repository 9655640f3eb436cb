//! On-disk, content-addressed cache store.

use crate::config::CacheConfig;
use crate::error::CacheResult;
use crate::traits::CacheStore;
use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Filesystem cache store.
///
/// Keys are hashed with SHA-256 and laid out as
/// `<directory>/<first 2 hex chars>/<remaining hex chars>`, so arbitrary
/// key strings map to safe file names. Writes go to a temporary sibling
/// and are renamed into place, which keeps concurrent readers from ever
/// observing a partial entry.
#[derive(Debug, Clone)]
pub struct FileCache {
    config: CacheConfig,
}

impl FileCache {
    /// Create a store; directories are created lazily on first write.
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    /// Create with just a directory (convenience method).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self::new(CacheConfig::new(path))
    }

    /// Root directory of this store.
    pub fn directory(&self) -> &Path {
        &self.config.directory
    }

    /// Get the full filesystem path for a key.
    pub fn entry_path(&self, key: &str) -> PathBuf {
        let digest = hex::encode(Sha256::digest(self.config.build_key(key).as_bytes()));
        let (shard, rest) = digest.split_at(2);
        self.config.directory.join(shard).join(rest)
    }
}

#[async_trait]
impl CacheStore for FileCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let path = self.entry_path(key);

        match fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn put(&self, key: &str, value: Bytes) -> CacheResult<()> {
        let path = self.entry_path(key);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let temp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        fs::write(&temp, &value).await?;
        if let Err(e) = fs::rename(&temp, &path).await {
            let _ = fs::remove_file(&temp).await;
            return Err(e.into());
        }

        debug!(path = ?path, size = value.len(), "Stored cache entry");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        match fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(fs::try_exists(self.entry_path(key)).await?)
    }

    async fn clear(&self) -> CacheResult<()> {
        match fs::remove_dir_all(&self.config.directory).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
