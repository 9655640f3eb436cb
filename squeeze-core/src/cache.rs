//! Cache adapter and session cache

use crate::algorithm::Algorithm;
use bytes::Bytes;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use squeeze_cache::CacheStore;
use squeeze_codec::ENGINE_VERSION;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Address of one compression result.
///
/// Changes whenever the asset name, the content, the algorithm, its
/// effective options, or the codec engine version change.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Compute the key for compressing `content` of asset `name`
    pub fn new(name: &str, algorithm: &Algorithm, content: &[u8]) -> Self {
        let content_hash = hex::encode(Sha256::digest(content));
        let options = algorithm.options().fingerprint();

        let mut hasher = Sha256::new();
        for part in [
            name,
            algorithm.identity(),
            options.as_str(),
            ENGINE_VERSION,
            content_hash.as_str(),
        ] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }

        Self(hex::encode(hasher.finalize()))
    }

    /// Hex form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Persistent result cache as seen by the pipeline.
///
/// Never fails: read errors are misses and write errors are dropped.
/// A disabled cache misses every lookup and stores nothing.
#[derive(Clone, Default)]
pub struct CompressionCache {
    store: Option<Arc<dyn CacheStore>>,
}

impl CompressionCache {
    /// Cache backed by `store`
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Cache that never hits
    pub fn disabled() -> Self {
        Self { store: None }
    }

    /// Whether a store is attached
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Look up a result
    pub async fn get(&self, key: &CacheKey) -> Option<Bytes> {
        let store = self.store.as_ref()?;

        match store.get(key.as_str()).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Store a result, best effort
    pub async fn store(&self, key: &CacheKey, payload: Bytes) {
        let Some(store) = &self.store else {
            return;
        };

        if let Err(e) = store.put(key.as_str(), payload).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}

impl fmt::Debug for CompressionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    source: Bytes,
    output: Bytes,
}

/// Outputs remembered for the lifetime of a watch session.
///
/// Entries are keyed by configuration scope and asset name, and only hit
/// when the host hands back the very same content buffer, so unchanged
/// assets skip hashing entirely. Clones share state; give two plugins
/// the same `SessionCache` to let them share entries.
#[derive(Debug, Clone, Default)]
pub struct SessionCache {
    entries: Arc<Mutex<HashMap<String, HashMap<String, SessionEntry>>>>,
}

impl SessionCache {
    /// Create an empty session cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Output remembered for `name` if `source` is the same buffer
    pub fn get(&self, scope: &str, name: &str, source: &Bytes) -> Option<Bytes> {
        let entries = self.entries.lock();
        let entry = entries.get(scope)?.get(name)?;

        if entry.source.as_ptr() == source.as_ptr() && entry.source.len() == source.len() {
            Some(entry.output.clone())
        } else {
            None
        }
    }

    /// Remember an output
    pub fn insert(&self, scope: &str, name: &str, source: Bytes, output: Bytes) {
        self.entries
            .lock()
            .entry(scope.to_string())
            .or_default()
            .insert(name.to_string(), SessionEntry { source, output });
    }

    /// Number of remembered outputs
    pub fn len(&self) -> usize {
        self.entries.lock().values().map(HashMap::len).sum()
    }

    /// Whether nothing is remembered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::AlgorithmSpec;
    use async_trait::async_trait;
    use squeeze_cache::{CacheError, CacheResult, InMemoryCache};
    use squeeze_codec::CompressionOptions;

    fn custom(identity: &str, options: CompressionOptions) -> Algorithm {
        AlgorithmSpec::blocking(identity, |input: &[u8], _: &CompressionOptions| {
            Ok::<_, crate::error::BoxError>(input.to_vec())
        })
        .resolve(&options)
        .unwrap()
    }

    #[test]
    fn test_key_sensitivity() {
        let algorithm = custom("a", CompressionOptions::new());
        let base = CacheKey::new("main.js", &algorithm, b"content");

        assert_eq!(base, CacheKey::new("main.js", &algorithm, b"content"));
        assert_ne!(base, CacheKey::new("main.js", &algorithm, b"content!"));
        assert_ne!(base, CacheKey::new("other.js", &algorithm, b"content"));
        assert_ne!(
            base,
            CacheKey::new("main.js", &custom("b", CompressionOptions::new()), b"content")
        );
        assert_ne!(
            base,
            CacheKey::new(
                "main.js",
                &custom("a", CompressionOptions::new().with("level", 1)),
                b"content"
            )
        );
        assert_eq!(base.as_str().len(), 64);
    }

    #[tokio::test]
    async fn test_disabled_cache_never_hits() {
        let cache = CompressionCache::disabled();
        let key = CacheKey::new("a", &custom("a", CompressionOptions::new()), b"x");

        cache.store(&key, Bytes::from_static(b"out")).await;
        assert!(!cache.is_enabled());
        assert_eq!(cache.get(&key).await, None);
    }

    #[tokio::test]
    async fn test_enabled_cache_round_trip() {
        let cache = CompressionCache::new(Arc::new(InMemoryCache::new()));
        let key = CacheKey::new("a", &custom("a", CompressionOptions::new()), b"x");

        assert_eq!(cache.get(&key).await, None);
        cache.store(&key, Bytes::from_static(b"out")).await;
        assert_eq!(cache.get(&key).await, Some(Bytes::from_static(b"out")));
    }

    struct FailingStore;

    #[async_trait]
    impl CacheStore for FailingStore {
        async fn get(&self, _key: &str) -> CacheResult<Option<Bytes>> {
            Err(CacheError::Other("read refused".to_string()))
        }

        async fn put(&self, _key: &str, _value: Bytes) -> CacheResult<()> {
            Err(CacheError::Other("write refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> CacheResult<()> {
            Ok(())
        }

        async fn clear(&self) -> CacheResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_errors_are_swallowed() {
        let cache = CompressionCache::new(Arc::new(FailingStore));
        let key = CacheKey::new("a", &custom("a", CompressionOptions::new()), b"x");

        cache.store(&key, Bytes::from_static(b"out")).await;
        assert_eq!(cache.get(&key).await, None);
    }

    #[test]
    fn test_session_requires_same_buffer() {
        let session = SessionCache::new();
        let source = Bytes::from(vec![1u8; 64]);
        session.insert("gzip", "a.js", source.clone(), Bytes::from_static(b"z"));

        assert_eq!(
            session.get("gzip", "a.js", &source.clone()),
            Some(Bytes::from_static(b"z"))
        );
        // equal bytes, different buffer
        assert_eq!(session.get("gzip", "a.js", &Bytes::from(vec![1u8; 64])), None);
        assert_eq!(session.get("brotliCompress", "a.js", &source), None);
        assert_eq!(session.len(), 1);

        let shared = session.clone();
        shared.clear();
        assert!(session.is_empty());
    }
}
