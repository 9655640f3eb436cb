//! Error types for cache operations.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-specific errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error from an on-disk store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic backend error
    #[error("Cache error: {0}")]
    Other(String),
}

impl CacheError {
    /// Check if this error came from the filesystem.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
