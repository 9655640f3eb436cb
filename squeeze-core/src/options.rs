//! Declarative plugin options

use crate::config::{CacheSetting, CompressionPluginBuilder, DeleteOriginalAssets, PluginConfig};
use crate::error::ConfigError;
use crate::rules::{Rule, Rules};
use serde::Deserialize;
use squeeze_codec::CompressionOptions;
use std::path::PathBuf;

/// Plugin options as found in a build configuration file.
///
/// ```
/// use squeeze_core::PluginOptions;
///
/// let options = PluginOptions::from_json(r#"{
///     "test": { "regex": "\\.js$" },
///     "algorithm": "brotliCompress",
///     "compressionOptions": { "quality": 5 },
///     "threshold": 1024,
///     "minRatio": 0.9,
///     "deleteOriginalAssets": "keep-source-map",
///     "cache": false
/// }"#).unwrap();
///
/// assert_eq!(options.threshold, Some(1024));
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PluginOptions {
    /// Names must match one of these rules
    #[serde(default)]
    pub test: Option<RuleSpec>,
    /// Names must also match one of these rules
    #[serde(default)]
    pub include: Option<RuleSpec>,
    /// Names matching any of these rules are skipped
    #[serde(default)]
    pub exclude: Option<RuleSpec>,
    /// Built-in algorithm name
    #[serde(default)]
    pub algorithm: Option<String>,
    /// Options passed to the algorithm
    #[serde(default)]
    pub compression_options: Option<CompressionOptions>,
    /// Minimum input size in bytes
    #[serde(default)]
    pub threshold: Option<u64>,
    /// Largest accepted compressed/original ratio
    #[serde(default)]
    pub min_ratio: Option<f64>,
    /// Destination filename template
    #[serde(default)]
    pub filename: Option<String>,
    /// Original handling
    #[serde(default)]
    pub delete_original_assets: Option<DeleteOriginalAssets>,
    /// Cache switch or directory
    #[serde(default)]
    pub cache: Option<CacheOption>,
}

/// One rule or a list of rules
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RuleSpec {
    /// Single rule
    One(RuleItem),
    /// Any of several rules
    Many(Vec<RuleItem>),
}

/// A rule in serialized form: a prefix string or `{ "regex": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RuleItem {
    /// Names starting with this string
    Prefix(String),
    /// Names matching this pattern
    Regex(RegexRule),
}

/// `{ "regex": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegexRule {
    /// Pattern source
    pub regex: String,
}

/// `cache` option: a switch or a directory
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CacheOption {
    /// Enable or disable the default cache
    Enabled(bool),
    /// Cache directory
    Directory(PathBuf),
}

impl RuleItem {
    fn compile(self) -> Result<Rule, ConfigError> {
        match self {
            Self::Prefix(prefix) => Ok(Rule::prefix(prefix)),
            Self::Regex(RegexRule { regex }) => Rule::regex(&regex),
        }
    }
}

impl RuleSpec {
    /// Compile into matchable rules
    pub fn compile(self) -> Result<Rules, ConfigError> {
        let items = match self {
            Self::One(item) => vec![item],
            Self::Many(items) => items,
        };

        items.into_iter().map(RuleItem::compile).collect()
    }
}

impl From<CacheOption> for CacheSetting {
    fn from(option: CacheOption) -> Self {
        match option {
            CacheOption::Enabled(enabled) => enabled.into(),
            CacheOption::Directory(dir) => Self::Directory(dir),
        }
    }
}

impl PluginOptions {
    /// Parse a JSON options document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Builder preloaded with these options
    pub fn into_builder(self) -> Result<CompressionPluginBuilder, ConfigError> {
        let mut builder = CompressionPluginBuilder::new();

        if let Some(test) = self.test {
            builder = builder.test(test.compile()?);
        }
        if let Some(include) = self.include {
            builder = builder.include(include.compile()?);
        }
        if let Some(exclude) = self.exclude {
            builder = builder.exclude(exclude.compile()?);
        }
        if let Some(algorithm) = self.algorithm {
            builder = builder.algorithm(algorithm);
        }
        if let Some(options) = self.compression_options {
            builder = builder.compression_options(options);
        }
        if let Some(threshold) = self.threshold {
            builder = builder.threshold(threshold);
        }
        if let Some(min_ratio) = self.min_ratio {
            builder = builder.min_ratio(min_ratio);
        }
        if let Some(filename) = self.filename {
            builder = builder.filename(filename);
        }
        if let Some(mode) = self.delete_original_assets {
            builder = builder.delete_original_assets(mode);
        }
        if let Some(cache) = self.cache {
            builder = builder.cache(cache);
        }

        Ok(builder)
    }

    /// Validate into a configuration
    pub fn into_config(self) -> Result<PluginConfig, ConfigError> {
        self.into_builder()?.build_config()
    }
}
