// Squeeze - build asset compression for Rust
//
// This library compresses the outputs of a build pass and emits the
// compressed variants as new assets, caching results across rebuilds.

// Re-export core functionality
pub use squeeze_core::*;

// Re-export member crates
pub use squeeze_cache;
pub use squeeze_codec;

pub use squeeze_cache::{CacheConfig, CacheStore, FileCache, InMemoryCache, TieredCache};
pub use squeeze_codec::{Codec, ENGINE_VERSION};

// Re-export for implementing hosts and stores
pub use async_trait::async_trait;
pub use bytes::Bytes;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{Bytes, CacheStore, async_trait};
    pub use squeeze_core::prelude::*;
}
