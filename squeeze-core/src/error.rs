//! Error types for the compression pipeline

use squeeze_codec::CodecError;
use thiserror::Error;

/// Boxed error returned by custom algorithm functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, SqueezeError>;

/// Configuration errors, raised once when a plugin is built
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown algorithm, unavailable codec, or bad codec option
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A selection rule is not a valid regular expression
    #[error("Invalid rule pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The offending pattern
        pattern: String,
        /// Regex compiler error
        #[source]
        source: regex::Error,
    },

    /// An option has an invalid value
    #[error("Invalid option `{option}`: {reason}")]
    InvalidOption {
        /// Option name
        option: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// Options document could not be parsed
    #[error("Failed to parse options: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by the host asset store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    /// Destination name is already taken
    #[error("Conflict: multiple assets emit different content to the same filename {0}")]
    Conflict(String),

    /// Asset does not exist
    #[error("Asset not found: {0}")]
    NotFound(String),
}

/// Errors reported on the host error channel
#[derive(Error, Debug)]
pub enum SqueezeError {
    /// The compression backend failed for one asset
    #[error("Failed to compress {asset}: {source}")]
    Compression {
        /// Name of the asset that failed
        asset: String,
        /// Backend error
        #[source]
        source: BoxError,
    },

    /// The host rejected an asset mutation
    #[error(transparent)]
    Asset(#[from] AssetError),
}

impl SqueezeError {
    /// Check if this is a per-asset compression failure.
    pub fn is_compression(&self) -> bool {
        matches!(self, Self::Compression { .. })
    }

    /// Name of the asset this error concerns, if any.
    pub fn asset(&self) -> Option<&str> {
        match self {
            Self::Compression { asset, .. } => Some(asset),
            Self::Asset(AssetError::Conflict(name) | AssetError::NotFound(name)) => Some(name),
        }
    }
}
