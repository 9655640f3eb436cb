//! Result caching for squeeze.
//!
//! Provides a byte-oriented [`CacheStore`] interface with an in-memory
//! store, a content-addressed on-disk store, and a two-layer store that
//! shadows the disk with memory for the lifetime of a process.
//!
//! # Examples
//!
//! ```no_run
//! use squeeze_cache::*;
//! use bytes::Bytes;
//!
//! # async fn example() -> CacheResult<()> {
//! let store = open_store(CacheConfig::new("/tmp/squeeze-cache"));
//!
//! store.put("fingerprint", Bytes::from_static(b"compressed")).await?;
//! let hit = store.get("fingerprint").await?;
//! assert!(hit.is_some());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod tiered;
pub mod traits;

use std::sync::Arc;

pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use file::FileCache;
pub use memory::InMemoryCache;
pub use tiered::{TieredCache, TieredCacheConfig};
pub use traits::CacheStore;

/// Open the store described by `config`.
///
/// Returns the on-disk store, fronted by an in-memory layer when
/// `config.memory_layer` is set.
pub fn open_store(config: CacheConfig) -> Arc<dyn CacheStore> {
    let memory_layer = config.memory_layer;
    let disk = Arc::new(FileCache::new(config));

    if memory_layer {
        Arc::new(TieredCache::new(Arc::new(InMemoryCache::new()), disk))
    } else {
        disk
    }
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::CacheConfig;
    pub use crate::error::{CacheError, CacheResult};
    pub use crate::file::FileCache;
    pub use crate::memory::InMemoryCache;
    pub use crate::open_store;
    pub use crate::tiered::{TieredCache, TieredCacheConfig};
    pub use crate::traits::CacheStore;
}
