//! Open-ended compression option maps

use crate::{CodecError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Compression options passed to a codec.
///
/// Built-in codecs read a handful of well-known keys (`level`, `quality`,
/// `lgwin`); custom algorithms receive the whole map. Keys are kept sorted
/// so the serialized form is stable and can be fingerprinted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompressionOptions(BTreeMap<String, Value>);

impl CompressionOptions {
    /// Create an empty option map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace an option
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// Look up an option
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Number of options
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over options in key order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Lay `self` over `defaults`; values in `self` win on conflict.
    pub fn merged_over(&self, defaults: &CompressionOptions) -> CompressionOptions {
        let mut merged = defaults.0.clone();
        merged.extend(self.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        CompressionOptions(merged)
    }

    /// Read an unsigned integer option, checking its range.
    pub fn get_u32_in(&self, key: &str, min: u32, max: u32) -> Result<Option<u32>> {
        let Some(value) = self.0.get(key) else {
            return Ok(None);
        };

        let number = value.as_u64().ok_or_else(|| CodecError::InvalidOption {
            option: key.to_string(),
            reason: format!("expected a non-negative integer, got {}", value),
        })?;

        if number < u64::from(min) || number > u64::from(max) {
            return Err(CodecError::InvalidOption {
                option: key.to_string(),
                reason: format!("{} is outside {}..={}", number, min, max),
            });
        }

        Ok(Some(number as u32))
    }

    /// Stable string form used for cache fingerprints
    pub fn fingerprint(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_default()
    }
}

impl From<BTreeMap<String, Value>> for CompressionOptions {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for CompressionOptions {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
