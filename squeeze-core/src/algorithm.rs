//! Algorithm invoker
//!
//! [`AlgorithmSpec`] is what a user configures: a codec name or a
//! function. It is resolved once, at configuration time, into an
//! [`Algorithm`] whose [`compress`](Algorithm::compress) is the single
//! async entry point the pipeline calls.

use crate::error::{BoxError, ConfigError};
use crate::naming::Filename;
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use sha2::{Digest, Sha256};
use squeeze_codec::{BuiltinAlgorithm, Codec, CompressionOptions};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

/// Future returned by a custom compression function
pub type CompressFuture = BoxFuture<'static, Result<Bytes, BoxError>>;

/// Uniform custom compression function
pub type CompressFn = dyn Fn(Bytes, CompressionOptions) -> CompressFuture + Send + Sync;

/// Configured compression backend, before resolution
#[derive(Clone)]
pub enum AlgorithmSpec {
    /// Built-in codec name such as `gzip` or `brotliCompress`
    Name(String),
    /// User-supplied function
    Function {
        /// Stable identity, mixed into cache keys
        identity: String,
        /// The function
        func: Arc<CompressFn>,
    },
}

impl AlgorithmSpec {
    /// Async custom function.
    ///
    /// Any output convertible to [`Bytes`] is accepted, and any error
    /// convertible to a boxed error.
    pub fn function<F, Fut, O, E>(identity: impl Into<String>, func: F) -> Self
    where
        F: Fn(Bytes, CompressionOptions) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
        O: Into<Bytes>,
        E: Into<BoxError>,
    {
        let func: Arc<CompressFn> = Arc::new(move |input, options| {
            let fut = func(input, options);
            async move {
                fut.await
                    .map(Into::<Bytes>::into)
                    .map_err(Into::<BoxError>::into)
            }
            .boxed()
        });

        Self::Function {
            identity: identity.into(),
            func,
        }
    }

    /// Synchronous custom function, run on the blocking thread pool
    pub fn blocking<F, O, E>(identity: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[u8], &CompressionOptions) -> Result<O, E> + Send + Sync + 'static,
        O: Into<Bytes> + Send + 'static,
        E: Into<BoxError> + Send + 'static,
    {
        let func = Arc::new(func);

        Self::function(identity, move |input: Bytes, options: CompressionOptions| {
            let func = Arc::clone(&func);
            async move {
                tokio::task::spawn_blocking(move || {
                    func(&input, &options)
                        .map(Into::<Bytes>::into)
                        .map_err(Into::<BoxError>::into)
                })
                .await
                .map_err(BoxError::from)?
            }
        })
    }

    /// Resolve against the user options.
    ///
    /// Built-in names are looked up and their defaults merged underneath
    /// `options`; functions receive `options` unchanged.
    pub fn resolve(self, options: &CompressionOptions) -> Result<Algorithm, ConfigError> {
        match self {
            Self::Name(name) => {
                let codec = Codec::from_name(&name, options)?;
                Ok(Algorithm::Builtin(Arc::new(codec)))
            }
            Self::Function { identity, func } => {
                if identity.trim().is_empty() {
                    return Err(ConfigError::InvalidOption {
                        option: "algorithm",
                        reason: "custom algorithms need a non-empty identity".to_string(),
                    });
                }

                Ok(Algorithm::Custom {
                    identity,
                    func,
                    options: options.clone(),
                })
            }
        }
    }

    /// The built-in algorithm this names, if it is a known one
    pub fn builtin(&self) -> Option<BuiltinAlgorithm> {
        match self {
            Self::Name(name) => name.parse().ok(),
            Self::Function { .. } => None,
        }
    }
}

impl Default for AlgorithmSpec {
    fn default() -> Self {
        Self::Name(BuiltinAlgorithm::Gzip.name().to_string())
    }
}

impl From<&str> for AlgorithmSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for AlgorithmSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<BuiltinAlgorithm> for AlgorithmSpec {
    fn from(algorithm: BuiltinAlgorithm) -> Self {
        Self::Name(algorithm.name().to_string())
    }
}

impl fmt::Debug for AlgorithmSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.debug_tuple("Name").field(name).finish(),
            Self::Function { identity, .. } => f
                .debug_struct("Function")
                .field("identity", identity)
                .finish_non_exhaustive(),
        }
    }
}

/// Resolved compression backend
#[derive(Clone)]
pub enum Algorithm {
    /// Built-in codec with merged options
    Builtin(Arc<Codec>),
    /// Custom function with the user's options
    Custom {
        /// Stable identity
        identity: String,
        /// The function
        func: Arc<CompressFn>,
        /// Options handed to every call
        options: CompressionOptions,
    },
}

impl Algorithm {
    /// Identity used in cache keys and logs
    pub fn identity(&self) -> &str {
        match self {
            Self::Builtin(codec) => codec.algorithm().name(),
            Self::Custom { identity, .. } => identity,
        }
    }

    /// Effective options
    pub fn options(&self) -> &CompressionOptions {
        match self {
            Self::Builtin(codec) => codec.options(),
            Self::Custom { options, .. } => options,
        }
    }

    /// The built-in codec, if any
    pub fn builtin(&self) -> Option<BuiltinAlgorithm> {
        match self {
            Self::Builtin(codec) => Some(codec.algorithm()),
            Self::Custom { .. } => None,
        }
    }

    /// Stable description of algorithm and options
    pub fn fingerprint(&self) -> String {
        format!("{}:{}", self.identity(), self.options().fingerprint())
    }

    /// Label under which originals record their derivative.
    ///
    /// Built-in codecs use a fixed label. Custom functions are labelled
    /// by the extension of a template filename, or by a digest of the
    /// filename function's identity.
    pub fn relation_label(&self, filename: &Filename) -> String {
        match (self, filename) {
            (Self::Builtin(codec), _) => codec.algorithm().relation_label().to_string(),
            (Self::Custom { .. }, Filename::Template(_)) => {
                format!("{}ed", filename.template_extension().unwrap_or_default())
            }
            (Self::Custom { .. }, Filename::Function { identity, .. }) => {
                let digest = hex::encode(Sha256::digest(identity.as_bytes()));
                format!("compression-function-{}", &digest[..32])
            }
        }
    }

    /// Compress one buffer.
    ///
    /// Built-in codecs run on the blocking thread pool.
    pub async fn compress(&self, input: Bytes) -> Result<Bytes, BoxError> {
        match self {
            Self::Builtin(codec) => {
                let codec = Arc::clone(codec);
                let output = tokio::task::spawn_blocking(move || codec.compress(&input)).await??;
                Ok(Bytes::from(output))
            }
            Self::Custom { func, options, .. } => func(input, options.clone()).await,
        }
    }
}

impl fmt::Debug for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Builtin(codec) => f.debug_tuple("Builtin").field(codec).finish(),
            Self::Custom {
                identity, options, ..
            } => f
                .debug_struct("Custom")
                .field("identity", identity)
                .field("options", options)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::PathData;

    #[test]
    fn test_unknown_name_fails_at_resolution() {
        let err = AlgorithmSpec::from("lzma")
            .resolve(&CompressionOptions::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::Codec(_)));
        assert!(err.to_string().contains("lzma"));
    }

    #[test]
    fn test_empty_identity_rejected() {
        let spec = AlgorithmSpec::function("  ", |input: Bytes, _| async move {
            Ok::<_, BoxError>(input)
        });
        assert!(matches!(
            spec.resolve(&CompressionOptions::new()),
            Err(ConfigError::InvalidOption { option: "algorithm", .. })
        ));
    }

    #[test]
    fn test_relation_labels() {
        let gzip = AlgorithmSpec::from("gzip")
            .resolve(&CompressionOptions::new())
            .unwrap();
        assert_eq!(gzip.relation_label(&"[path][base].gz".into()), "gzipped");

        let custom = AlgorithmSpec::function("rot", |input: Bytes, _| async move {
            Ok::<_, BoxError>(input)
        })
        .resolve(&CompressionOptions::new())
        .unwrap();
        assert_eq!(custom.relation_label(&"[path][base].gz".into()), "gzed");
        assert_eq!(custom.relation_label(&"[path][base].br?v=1".into()), "bred");

        let by_fn = Filename::function("name-v1", |data: &PathData| data.file.clone());
        let label = custom.relation_label(&by_fn);
        assert!(label.starts_with("compression-function-"));
        assert_eq!(label.len(), "compression-function-".len() + 32);
    }

    #[tokio::test]
    async fn test_custom_function_receives_options() {
        let spec = AlgorithmSpec::function("tagged", |input: Bytes, options: CompressionOptions| async move {
            let tag = options
                .get("tag")
                .and_then(|v| v.as_str())
                .unwrap_or("none")
                .to_string();
            let mut out = tag.into_bytes();
            out.extend_from_slice(&input);
            Ok::<_, BoxError>(out)
        });

        let algorithm = spec
            .resolve(&CompressionOptions::new().with("tag", "x:"))
            .unwrap();
        let out = algorithm.compress(Bytes::from_static(b"abc")).await.unwrap();
        assert_eq!(&out[..], b"x:abc");
        assert_eq!(algorithm.identity(), "tagged");
    }

    #[tokio::test]
    async fn test_blocking_function_errors_propagate() {
        let algorithm = AlgorithmSpec::blocking("broken", |_: &[u8], _: &CompressionOptions| {
            Err::<Vec<u8>, _>("backend refused")
        })
        .resolve(&CompressionOptions::new())
        .unwrap();

        let err = algorithm.compress(Bytes::from_static(b"abc")).await.unwrap_err();
        assert_eq!(err.to_string(), "backend refused");
    }

    #[cfg(feature = "gzip")]
    #[tokio::test]
    async fn test_builtin_compresses_off_thread() {
        let algorithm = AlgorithmSpec::default()
            .resolve(&CompressionOptions::new())
            .unwrap();
        let input = Bytes::from("abcabcabc".repeat(100));
        let out = algorithm.compress(input.clone()).await.unwrap();
        assert!(out.len() < input.len());
        assert_eq!(algorithm.options().get("level"), Some(&serde_json::Value::from(9)));
    }
}
