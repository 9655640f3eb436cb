//! Cache configuration types.

use std::path::PathBuf;

/// Name of the directory created under the system temp dir when no
/// explicit cache location is configured.
pub const DEFAULT_CACHE_DIR_NAME: &str = "squeeze-cache";

/// On-disk cache configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Root directory for cache entries
    pub directory: PathBuf,

    /// Key prefix for all cache keys
    pub key_prefix: Option<String>,

    /// Shadow the disk store with an in-memory layer
    pub memory_layer: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: Self::default_directory(),
            key_prefix: None,
            memory_layer: true,
        }
    }
}

impl CacheConfig {
    /// Create a configuration rooted at `directory`.
    ///
    /// # Examples
    ///
    /// ```
    /// use squeeze_cache::CacheConfig;
    ///
    /// let config = CacheConfig::new("/tmp/my-cache").with_key_prefix("site");
    /// assert_eq!(config.build_key("abc"), "site:abc");
    /// ```
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    /// The directory used when caching is enabled without a location.
    pub fn default_directory() -> PathBuf {
        std::env::temp_dir().join(DEFAULT_CACHE_DIR_NAME)
    }

    /// Set the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    /// Disable the in-memory layer in front of the disk store.
    pub fn without_memory_layer(mut self) -> Self {
        self.memory_layer = false;
        self
    }

    /// Build the final key with prefix if configured.
    pub fn build_key(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.to_string(),
        }
    }
}
