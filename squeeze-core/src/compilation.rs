//! Host build interface and an in-memory host

use crate::asset::{Asset, AssetInfo};
use crate::error::{AssetError, SqueezeError};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::collections::BTreeMap;

/// The host's view of one build pass.
///
/// Mutations are synchronous; implementations guard their own state so
/// many pipeline tasks may call in concurrently.
pub trait Compilation: Send + Sync {
    /// Names of all current assets
    fn asset_names(&self) -> Vec<String>;

    /// Look up an asset
    fn get_asset(&self, name: &str) -> Option<Asset>;

    /// Add a new asset; fails if a different asset already has this name
    fn emit_asset(&self, name: &str, content: Bytes, info: AssetInfo) -> Result<(), AssetError>;

    /// Replace an existing asset's content and metadata
    fn update_asset(&self, name: &str, content: Bytes, info: AssetInfo)
    -> Result<(), AssetError>;

    /// Remove an asset, returning it if it existed
    fn delete_asset(&self, name: &str) -> Option<Asset>;

    /// Append to the pass's error channel
    fn report_error(&self, error: SqueezeError);

    /// Append to the pass's warning channel
    fn report_warning(&self, warning: String);
}

/// Extension point invoked once per build pass, after assets are final
/// and before they are written out.
#[async_trait]
pub trait Plugin: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Inspect and mutate the pass's assets
    async fn process_assets(&self, compilation: &dyn Compilation);
}

/// Asset set held in memory.
///
/// Emitting to a taken name succeeds only when the content is identical,
/// matching how build hosts treat duplicate outputs.
#[derive(Default)]
pub struct InMemoryCompilation {
    assets: RwLock<BTreeMap<String, Asset>>,
    errors: Mutex<Vec<SqueezeError>>,
    warnings: Mutex<Vec<String>>,
}

impl InMemoryCompilation {
    /// Create an empty compilation
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style asset insert
    pub fn with_asset(self, asset: Asset) -> Self {
        self.insert(asset);
        self
    }

    /// Insert or replace an asset without conflict checks
    pub fn insert(&self, asset: Asset) {
        self.assets.write().insert(asset.name.clone(), asset);
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.assets.read().len()
    }

    /// Whether there are no assets
    pub fn is_empty(&self) -> bool {
        self.assets.read().is_empty()
    }

    /// Whether an asset exists
    pub fn contains(&self, name: &str) -> bool {
        self.assets.read().contains_key(name)
    }

    /// Error messages reported so far
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().iter().map(ToString::to_string).collect()
    }

    /// Drain reported errors
    pub fn take_errors(&self) -> Vec<SqueezeError> {
        std::mem::take(&mut *self.errors.lock())
    }

    /// Warnings reported so far
    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().clone()
    }
}

impl Compilation for InMemoryCompilation {
    fn asset_names(&self) -> Vec<String> {
        self.assets.read().keys().cloned().collect()
    }

    fn get_asset(&self, name: &str) -> Option<Asset> {
        self.assets.read().get(name).cloned()
    }

    fn emit_asset(&self, name: &str, content: Bytes, info: AssetInfo) -> Result<(), AssetError> {
        let mut assets = self.assets.write();

        if let Some(existing) = assets.get(name)
            && existing.content != content
        {
            return Err(AssetError::Conflict(name.to_string()));
        }

        assets.insert(
            name.to_string(),
            Asset {
                name: name.to_string(),
                content,
                info,
            },
        );
        Ok(())
    }

    fn update_asset(
        &self,
        name: &str,
        content: Bytes,
        info: AssetInfo,
    ) -> Result<(), AssetError> {
        let mut assets = self.assets.write();
        let asset = assets
            .get_mut(name)
            .ok_or_else(|| AssetError::NotFound(name.to_string()))?;

        asset.content = content;
        asset.info = info;
        Ok(())
    }

    fn delete_asset(&self, name: &str) -> Option<Asset> {
        self.assets.write().remove(name)
    }

    fn report_error(&self, error: SqueezeError) {
        self.errors.lock().push(error);
    }

    fn report_warning(&self, warning: String) {
        self.warnings.lock().push(warning);
    }
}
