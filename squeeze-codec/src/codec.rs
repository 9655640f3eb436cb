//! Resolved codec: algorithm plus merged, validated options

use crate::{BuiltinAlgorithm, CodecError, CodecSettings, CompressionOptions, Result};

/// Version token mixed into cache fingerprints so upgrading the codec
/// crate invalidates previously cached output.
pub const ENGINE_VERSION: &str = concat!("squeeze-codec/", env!("CARGO_PKG_VERSION"));

/// A built-in algorithm bound to its final option set.
///
/// Construction merges the algorithm defaults under the user options and
/// validates the result, so per-asset compression never re-merges or
/// re-validates.
#[derive(Debug, Clone, PartialEq)]
pub struct Codec {
    algorithm: BuiltinAlgorithm,
    options: CompressionOptions,
    settings: CodecSettings,
}

impl Codec {
    /// Resolve an algorithm with user options
    pub fn new(algorithm: BuiltinAlgorithm, user_options: &CompressionOptions) -> Result<Self> {
        if !algorithm.is_available() {
            return Err(CodecError::UnsupportedAlgorithm(algorithm.name().to_string()));
        }

        let options = user_options.merged_over(&algorithm.default_options());
        let settings = algorithm.settings(&options)?;

        tracing::debug!(
            algorithm = %algorithm,
            level = settings.level,
            "Resolved codec"
        );

        Ok(Self {
            algorithm,
            options,
            settings,
        })
    }

    /// Resolve a codec by configuration name
    pub fn from_name(name: &str, user_options: &CompressionOptions) -> Result<Self> {
        Self::new(name.parse()?, user_options)
    }

    /// The underlying algorithm
    pub fn algorithm(&self) -> BuiltinAlgorithm {
        self.algorithm
    }

    /// Effective options (defaults merged with user values)
    pub fn options(&self) -> &CompressionOptions {
        &self.options
    }

    /// Backend settings extracted from the options
    pub fn settings(&self) -> CodecSettings {
        self.settings
    }

    /// Compress a buffer synchronously
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.algorithm.compress(data, self.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_options() {
        let codec = Codec::from_name("gzip", &CompressionOptions::new()).unwrap();
        assert_eq!(codec.settings().level, 9);
        assert_eq!(
            codec.options().get("level"),
            Some(&serde_json::Value::from(9))
        );
    }

    #[test]
    fn test_user_options_override_defaults() {
        let user = CompressionOptions::new().with("level", 1).with("memLevel", 8);
        let codec = Codec::from_name("deflate", &user).unwrap();

        assert_eq!(codec.settings().level, 1);
        // unknown keys are carried along
        assert!(codec.options().get("memLevel").is_some());
    }

    #[test]
    fn test_unknown_name_fails() {
        let err = Codec::from_name("snappy", &CompressionOptions::new()).unwrap_err();
        assert!(matches!(err, CodecError::UnknownAlgorithm(ref name) if name == "snappy"));
    }

    #[test]
    fn test_invalid_option_fails_at_resolution() {
        let user = CompressionOptions::new().with("level", "fast");
        assert!(matches!(
            Codec::from_name("gzip", &user),
            Err(CodecError::InvalidOption { .. })
        ));
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_compress_uses_resolved_settings() {
        let data = "squeeze ".repeat(200);
        let fast = Codec::from_name("gzip", &CompressionOptions::new().with("level", 0)).unwrap();
        let best = Codec::from_name("gzip", &CompressionOptions::new()).unwrap();

        let stored = fast.compress(data.as_bytes()).unwrap();
        let packed = best.compress(data.as_bytes()).unwrap();
        assert!(packed.len() < stored.len());
    }

    #[test]
    fn test_engine_version_names_crate() {
        assert!(ENGINE_VERSION.starts_with("squeeze-codec/"));
    }
}
