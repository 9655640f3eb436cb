//! Plugin configuration and its builder

use crate::algorithm::{Algorithm, AlgorithmSpec};
use crate::cache::{CompressionCache, SessionCache};
use crate::error::ConfigError;
use crate::naming::Filename;
use crate::plugin::CompressionPlugin;
use crate::rules::{MatchRules, Rules};
use crate::selector::AssetSelector;
use serde::Deserialize;
use squeeze_cache::{CacheConfig, CacheStore, InMemoryCache, open_store};
use squeeze_codec::{BuiltinAlgorithm, CompressionOptions};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default upper bound on compressed/original size
pub const DEFAULT_MIN_RATIO: f64 = 0.8;

/// What happens to an original once its derivative is emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "DeleteOriginalAssetsRepr")]
pub enum DeleteOriginalAssets {
    /// Keep it and relate it to the derivative
    #[default]
    Keep,
    /// Delete it
    Delete,
    /// Delete it, first dropping its source map relation
    KeepSourceMap,
}

impl DeleteOriginalAssets {
    /// Whether the original is removed
    pub fn deletes(&self) -> bool {
        !matches!(self, Self::Keep)
    }
}

impl From<bool> for DeleteOriginalAssets {
    fn from(delete: bool) -> Self {
        if delete { Self::Delete } else { Self::Keep }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DeleteOriginalAssetsRepr {
    Flag(bool),
    Mode(String),
}

impl TryFrom<DeleteOriginalAssetsRepr> for DeleteOriginalAssets {
    type Error = String;

    fn try_from(repr: DeleteOriginalAssetsRepr) -> Result<Self, Self::Error> {
        match repr {
            DeleteOriginalAssetsRepr::Flag(flag) => Ok(flag.into()),
            DeleteOriginalAssetsRepr::Mode(mode) if mode == "keep-source-map" => {
                Ok(Self::KeepSourceMap)
            }
            DeleteOriginalAssetsRepr::Mode(mode) => Err(format!(
                "expected a boolean or \"keep-source-map\", got \"{}\"",
                mode
            )),
        }
    }
}

/// Where compression results are cached
#[derive(Clone, Default)]
pub enum CacheSetting {
    /// No caching
    Disabled,
    /// On-disk store in the default directory, fronted by memory
    #[default]
    Default,
    /// On-disk store in the given directory, fronted by memory
    Directory(PathBuf),
    /// Process-local memory only
    MemoryOnly,
    /// Caller-provided store
    Store(Arc<dyn CacheStore>),
}

impl CacheSetting {
    fn open(self) -> CompressionCache {
        match self {
            Self::Disabled => CompressionCache::disabled(),
            Self::Default => CompressionCache::new(open_store(CacheConfig::default())),
            Self::Directory(dir) => CompressionCache::new(open_store(CacheConfig::new(dir))),
            Self::MemoryOnly => CompressionCache::new(Arc::new(InMemoryCache::new())),
            Self::Store(store) => CompressionCache::new(store),
        }
    }
}

impl From<bool> for CacheSetting {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Default } else { Self::Disabled }
    }
}

impl From<PathBuf> for CacheSetting {
    fn from(dir: PathBuf) -> Self {
        Self::Directory(dir)
    }
}

impl From<&str> for CacheSetting {
    fn from(dir: &str) -> Self {
        Self::Directory(PathBuf::from(dir))
    }
}

impl From<Arc<dyn CacheStore>> for CacheSetting {
    fn from(store: Arc<dyn CacheStore>) -> Self {
        Self::Store(store)
    }
}

impl fmt::Debug for CacheSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("Disabled"),
            Self::Default => f.write_str("Default"),
            Self::Directory(dir) => f.debug_tuple("Directory").field(dir).finish(),
            Self::MemoryOnly => f.write_str("MemoryOnly"),
            Self::Store(_) => f.write_str("Store(..)"),
        }
    }
}

/// Validated, immutable plugin configuration
#[derive(Debug, Clone)]
pub struct PluginConfig {
    pub(crate) selector: AssetSelector,
    pub(crate) algorithm: Algorithm,
    pub(crate) min_ratio: f64,
    pub(crate) filename: Filename,
    pub(crate) delete_original_assets: DeleteOriginalAssets,
    pub(crate) cache: CompressionCache,
    pub(crate) relation_label: String,
}

impl PluginConfig {
    /// Candidate selection
    pub fn selector(&self) -> &AssetSelector {
        &self.selector
    }

    /// Resolved algorithm
    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    /// Minimum input size in bytes
    pub fn threshold(&self) -> u64 {
        self.selector.threshold()
    }

    /// Largest accepted compressed/original ratio
    pub fn min_ratio(&self) -> f64 {
        self.min_ratio
    }

    /// Destination naming
    pub fn filename(&self) -> &Filename {
        &self.filename
    }

    /// Original handling
    pub fn delete_original_assets(&self) -> DeleteOriginalAssets {
        self.delete_original_assets
    }

    /// Result cache
    pub fn cache(&self) -> &CompressionCache {
        &self.cache
    }

    /// Label for original-to-derivative relations
    pub fn relation_label(&self) -> &str {
        &self.relation_label
    }
}

/// Builder for [`CompressionPlugin`]
#[derive(Debug, Default)]
pub struct CompressionPluginBuilder {
    test: Option<Rules>,
    include: Option<Rules>,
    exclude: Option<Rules>,
    algorithm: AlgorithmSpec,
    compression_options: CompressionOptions,
    threshold: u64,
    min_ratio: Option<f64>,
    filename: Option<Filename>,
    delete_original_assets: DeleteOriginalAssets,
    cache: CacheSetting,
    session: Option<SessionCache>,
}

impl CompressionPluginBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Names must match one of these rules
    pub fn test(mut self, rules: impl Into<Rules>) -> Self {
        self.test = Some(rules.into());
        self
    }

    /// Names must also match one of these rules
    pub fn include(mut self, rules: impl Into<Rules>) -> Self {
        self.include = Some(rules.into());
        self
    }

    /// Names matching any of these rules are skipped
    pub fn exclude(mut self, rules: impl Into<Rules>) -> Self {
        self.exclude = Some(rules.into());
        self
    }

    /// Compression backend
    pub fn algorithm(mut self, algorithm: impl Into<AlgorithmSpec>) -> Self {
        self.algorithm = algorithm.into();
        self
    }

    /// Options passed to the backend, over its defaults
    pub fn compression_options(mut self, options: CompressionOptions) -> Self {
        self.compression_options = options;
        self
    }

    /// Minimum input size in bytes
    pub fn threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Largest accepted compressed/original ratio
    pub fn min_ratio(mut self, min_ratio: f64) -> Self {
        self.min_ratio = Some(min_ratio);
        self
    }

    /// Destination naming
    pub fn filename(mut self, filename: impl Into<Filename>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Original handling
    pub fn delete_original_assets(mut self, mode: impl Into<DeleteOriginalAssets>) -> Self {
        self.delete_original_assets = mode.into();
        self
    }

    /// Result cache
    pub fn cache(mut self, cache: impl Into<CacheSetting>) -> Self {
        self.cache = cache.into();
        self
    }

    /// Share a session cache with other plugins
    pub fn session_cache(mut self, session: SessionCache) -> Self {
        self.session = Some(session);
        self
    }

    /// Validate into a configuration
    pub fn build_config(self) -> Result<PluginConfig, ConfigError> {
        self.into_parts().map(|(config, _)| config)
    }

    /// Validate and create the plugin
    pub fn build(self) -> Result<CompressionPlugin, ConfigError> {
        let (config, session) = self.into_parts()?;
        Ok(CompressionPlugin::with_session(config, session.unwrap_or_default()))
    }

    fn into_parts(self) -> Result<(PluginConfig, Option<SessionCache>), ConfigError> {
        let min_ratio = self.min_ratio.unwrap_or(DEFAULT_MIN_RATIO);
        if !min_ratio.is_finite() || min_ratio < 0.0 {
            return Err(ConfigError::InvalidOption {
                option: "minRatio",
                reason: format!("must be a non-negative number, got {}", min_ratio),
            });
        }

        let filename = match self.filename {
            Some(filename) => filename,
            None => default_filename(self.algorithm.builtin()),
        };
        if let Filename::Template(template) = &filename
            && template.is_empty()
        {
            return Err(ConfigError::InvalidOption {
                option: "filename",
                reason: "template must not be empty".to_string(),
            });
        }

        let algorithm = self.algorithm.resolve(&self.compression_options)?;
        let relation_label = algorithm.relation_label(&filename);

        let rules = MatchRules {
            test: self.test,
            include: self.include,
            exclude: self.exclude,
        };

        tracing::debug!(
            algorithm = %algorithm.identity(),
            relation = %relation_label,
            threshold = self.threshold,
            min_ratio,
            cache = ?self.cache,
            "Configured compression plugin"
        );

        let config = PluginConfig {
            selector: AssetSelector::new(rules, self.threshold),
            algorithm,
            min_ratio,
            filename,
            delete_original_assets: self.delete_original_assets,
            cache: self.cache.open(),
            relation_label,
        };

        Ok((config, self.session))
    }
}

/// `[path][base].<ext>` with the algorithm's usual extension
pub fn default_filename(algorithm: Option<BuiltinAlgorithm>) -> Filename {
    let extension = algorithm
        .unwrap_or(BuiltinAlgorithm::Gzip)
        .default_extension();
    Filename::Template(format!("[path][base].{}", extension))
}
