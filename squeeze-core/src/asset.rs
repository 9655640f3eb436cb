//! Asset model

use bytes::Bytes;
use std::collections::BTreeMap;

/// A named build output plus its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Asset name; may carry `?query` and `#fragment` suffixes
    pub name: String,
    /// Raw content
    pub content: Bytes,
    /// Metadata flags and relations
    pub info: AssetInfo,
}

impl Asset {
    /// Create an asset with empty metadata
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            info: AssetInfo::default(),
        }
    }

    /// Replace the metadata
    pub fn with_info(mut self, info: AssetInfo) -> Self {
        self.info = info;
        self
    }

    /// Content length in bytes
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the content is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}

/// Asset metadata.
///
/// `compressed` marks derivatives produced by a compression pass so later
/// passes never compress them again; `immutable` marks content-hashed
/// names that may be cached forever.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetInfo {
    /// Asset was produced by compression
    pub compressed: bool,
    /// Asset name is content-addressed
    pub immutable: bool,
    /// Links to derived assets
    pub related: Related,
}

impl AssetInfo {
    /// Metadata for a freshly emitted derivative
    pub fn compressed() -> Self {
        Self {
            compressed: true,
            ..Default::default()
        }
    }

    /// Set the immutable flag
    pub fn with_immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    /// Record a source map relation
    pub fn with_source_map(mut self, name: impl Into<String>) -> Self {
        self.related.source_map = Some(name.into());
        self
    }
}

/// Relations from an asset to its derivatives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Related {
    /// Name of the asset's source map, if any
    pub source_map: Option<String>,
    derivatives: BTreeMap<String, String>,
}

impl Related {
    /// Derivative recorded under `label`
    pub fn get(&self, label: &str) -> Option<&str> {
        self.derivatives.get(label).map(String::as_str)
    }

    /// Whether a derivative is recorded under `label`
    pub fn contains(&self, label: &str) -> bool {
        self.derivatives.contains_key(label)
    }

    /// Record a derivative, keeping every other relation
    pub fn insert(&mut self, label: impl Into<String>, name: impl Into<String>) {
        self.derivatives.insert(label.into(), name.into());
    }

    /// All `(label, derivative)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.derivatives
            .iter()
            .map(|(label, name)| (label.as_str(), name.as_str()))
    }

    /// Whether no relation of any kind is recorded
    pub fn is_empty(&self) -> bool {
        self.source_map.is_none() && self.derivatives.is_empty()
    }
}
