//! Cache store trait definition.

use crate::error::CacheResult;
use async_trait::async_trait;
use bytes::Bytes;

/// Key-value store for compressed payloads.
///
/// Implementations must tolerate concurrent reads and writes from many
/// tasks; callers do no locking of their own.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get a payload from the cache.
    ///
    /// Returns `Ok(Some(bytes))` if the key exists, `Ok(None)` if not found,
    /// or an error if the backend failed.
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>>;

    /// Store a payload under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: Bytes) -> CacheResult<()>;

    /// Delete a key from the cache.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Check if a key exists in the cache.
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Clear all keys from the cache.
    ///
    /// **Warning:** For on-disk stores this removes every entry under the
    /// cache directory.
    async fn clear(&self) -> CacheResult<()>;
}
