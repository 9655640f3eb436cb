//! Two-layer caching (memory in front of a persistent store)

use crate::error::CacheResult;
use crate::traits::CacheStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Cache with an L1 (fast, process-local) and an L2 (persistent) layer.
///
/// L2 stays the source of truth: writes go to L2 first, and L1 only ever
/// holds values that were written to or read from L2.
pub struct TieredCache<L1, L2>
where
    L1: CacheStore,
    L2: CacheStore,
{
    l1: Arc<L1>,
    l2: Arc<L2>,
    config: TieredCacheConfig,
}

/// Tiered cache configuration
#[derive(Debug, Clone)]
pub struct TieredCacheConfig {
    /// Write-through to L1 on set
    pub write_through: bool,

    /// Promote L2 hits to L1
    pub promote_to_l1: bool,
}

impl Default for TieredCacheConfig {
    fn default() -> Self {
        Self {
            write_through: true,
            promote_to_l1: true,
        }
    }
}

impl<L1, L2> TieredCache<L1, L2>
where
    L1: CacheStore,
    L2: CacheStore,
{
    /// Create new tiered cache
    pub fn new(l1: Arc<L1>, l2: Arc<L2>) -> Self {
        Self::with_config(l1, l2, TieredCacheConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(l1: Arc<L1>, l2: Arc<L2>, config: TieredCacheConfig) -> Self {
        Self { l1, l2, config }
    }
}

impl<L1, L2> Clone for TieredCache<L1, L2>
where
    L1: CacheStore,
    L2: CacheStore,
{
    fn clone(&self) -> Self {
        Self {
            l1: self.l1.clone(),
            l2: self.l2.clone(),
            config: self.config.clone(),
        }
    }
}

#[async_trait]
impl<L1, L2> CacheStore for TieredCache<L1, L2>
where
    L1: CacheStore + 'static,
    L2: CacheStore + 'static,
{
    async fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        if let Some(value) = self.l1.get(key).await? {
            return Ok(Some(value));
        }

        if let Some(value) = self.l2.get(key).await? {
            if self.config.promote_to_l1 {
                let _ = self.l1.put(key, value.clone()).await;
            }
            return Ok(Some(value));
        }

        Ok(None)
    }

    async fn put(&self, key: &str, value: Bytes) -> CacheResult<()> {
        self.l2.put(key, value.clone()).await?;

        if self.config.write_through {
            self.l1.put(key, value).await?;
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.l1.delete(key).await?;
        self.l2.delete(key).await
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        if self.l1.exists(key).await? {
            return Ok(true);
        }
        self.l2.exists(key).await
    }

    async fn clear(&self) -> CacheResult<()> {
        self.l1.clear().await?;
        self.l2.clear().await
    }
}

#[cfg(test)]
mod tests_tiered {
    use super::*;
    use crate::InMemoryCache;

    #[tokio::test]
    async fn test_tiered_cache() {
        let l1 = Arc::new(InMemoryCache::new());
        let l2 = Arc::new(InMemoryCache::new());
        let cache = TieredCache::new(l1.clone(), l2.clone());

        cache.put("test", Bytes::from_static(b"value")).await.unwrap();

        // write-through populated both layers
        assert!(l1.get("test").await.unwrap().is_some());
        assert!(l2.get("test").await.unwrap().is_some());

        cache.delete("test").await.unwrap();
        assert_eq!(cache.get("test").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_l2_promotion() {
        let l1 = Arc::new(InMemoryCache::new());
        let l2 = Arc::new(InMemoryCache::new());
        let cache = TieredCache::new(l1.clone(), l2.clone());

        l2.put("key", Bytes::from_static(b"value")).await.unwrap();

        let value = cache.get("key").await.unwrap();
        assert_eq!(value, Some(Bytes::from_static(b"value")));
        assert!(l1.get("key").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_no_promotion_when_disabled() {
        let l1 = Arc::new(InMemoryCache::new());
        let l2 = Arc::new(InMemoryCache::new());
        let config = TieredCacheConfig {
            write_through: false,
            promote_to_l1: false,
        };
        let cache = TieredCache::with_config(l1.clone(), l2.clone(), config);

        l2.put("key", Bytes::from_static(b"value")).await.unwrap();
        assert!(cache.get("key").await.unwrap().is_some());
        assert!(l1.is_empty().await);

        cache.put("other", Bytes::from_static(b"x")).await.unwrap();
        assert!(l1.is_empty().await);
        assert!(cache.exists("other").await.unwrap());
    }
}
