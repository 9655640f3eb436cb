//! Built-in compression codecs for squeeze
//!
//! This crate resolves algorithm names into ready-to-run codecs. Each
//! codec carries its effective options (algorithm defaults with user
//! values laid over them) so callers never merge options per call.
//!
//! # Features
//!
//! - `gzip` - gzip, zlib deflate and raw deflate via flate2 (enabled by default)
//! - `brotli` - brotli compression (enabled by default)
//! - `zstd` - zstandard compression
//! - `full` - Enable all compression algorithms
//!
//! # Example
//!
//! ```rust,no_run
//! use squeeze_codec::{Codec, CompressionOptions};
//!
//! let codec = Codec::from_name("gzip", &CompressionOptions::new().with("level", 6))?;
//! let compressed = codec.compress(b"hello hello hello hello")?;
//! # Ok::<(), squeeze_codec::CodecError>(())
//! ```

mod algorithm;
mod codec;
mod error;
mod options;

pub use algorithm::{BuiltinAlgorithm, CodecSettings};
pub use codec::{Codec, ENGINE_VERSION};
pub use error::CodecError;
pub use options::CompressionOptions;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;
