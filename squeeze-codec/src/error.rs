//! Error types for codec operations

use thiserror::Error;

/// Errors that can occur while resolving or running a codec
#[derive(Error, Debug)]
pub enum CodecError {
    /// Compression operation failed
    #[error("Compression failed: {0}")]
    CompressionFailed(String),

    /// Invalid compression level
    #[error("Invalid compression level: {0} (must be between {1} and {2})")]
    InvalidLevel(u32, u32, u32),

    /// Algorithm name is not a built-in codec
    #[error("Algorithm \"{0}\" is not a built-in codec")]
    UnknownAlgorithm(String),

    /// Algorithm is known but its backend feature is disabled
    #[error("Unsupported compression algorithm: {0} (enable the matching crate feature)")]
    UnsupportedAlgorithm(String),

    /// An option value has the wrong type or is out of range
    #[error("Invalid compression option `{option}`: {reason}")]
    InvalidOption {
        /// Option key
        option: String,
        /// Why the value was rejected
        reason: String,
    },

    /// IO error during compression
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
