//! Per-asset compression pipeline

use crate::asset::{Asset, AssetInfo};
use crate::cache::{CacheKey, SessionCache};
use crate::compilation::Compilation;
use crate::config::{DeleteOriginalAssets, PluginConfig};
use crate::error::SqueezeError;
use bytes::Bytes;
use std::fmt;

/// Why an asset produced no derivative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The original already records a derivative under this label
    AlreadyRelated,
    /// Content is shorter than the threshold
    TooSmall,
    /// Compressed output is not small enough
    RatioRejected,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRelated => write!(f, "already-related"),
            Self::TooSmall => write!(f, "too-small"),
            Self::RatioRejected => write!(f, "ratio-rejected"),
        }
    }
}

/// Final state of one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// No derivative, nothing mutated
    Skipped(SkipReason),
    /// Error reported to the host, nothing mutated
    Failed(String),
    /// Derivative emitted under this name
    Emitted(String),
}

impl TaskOutcome {
    /// Whether a derivative was emitted
    pub fn is_emitted(&self) -> bool {
        matches!(self, Self::Emitted(_))
    }
}

/// Where a task's compressed output came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Session cache, same content buffer as a previous pass
    Session,
    /// Persistent cache
    Cache,
    /// Fresh compression
    Compressed,
}

/// Result of running one asset through the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    /// Original asset name
    pub asset: String,
    /// Final state
    pub outcome: TaskOutcome,
    /// How the output was obtained, if the task got that far
    pub resolution: Option<Resolution>,
}

/// Runs the decision sequence for single assets.
///
/// Borrowed configuration and session state; cheap to create per pass.
pub struct TaskPipeline<'a> {
    config: &'a PluginConfig,
    session: &'a SessionCache,
    scope: String,
}

impl<'a> TaskPipeline<'a> {
    /// Create a pipeline
    pub fn new(config: &'a PluginConfig, session: &'a SessionCache) -> Self {
        Self {
            config,
            session,
            scope: config.algorithm.fingerprint(),
        }
    }

    /// Process one asset.
    ///
    /// Never fails: errors are reported on the host's error channel and
    /// yield [`TaskOutcome::Failed`] with the asset set unchanged.
    pub async fn run(&self, compilation: &dyn Compilation, asset: Asset) -> TaskReport {
        let name = asset.name.clone();
        let (outcome, resolution) = self.process(compilation, asset).await;

        TaskReport {
            asset: name,
            outcome,
            resolution,
        }
    }

    async fn process(
        &self,
        compilation: &dyn Compilation,
        asset: Asset,
    ) -> (TaskOutcome, Option<Resolution>) {
        let config = self.config;

        if asset.info.related.contains(&config.relation_label) {
            tracing::debug!(asset = %asset.name, relation = %config.relation_label, "Already related, skipping");
            return (TaskOutcome::Skipped(SkipReason::AlreadyRelated), None);
        }

        if (asset.len() as u64) < config.threshold() {
            tracing::debug!(asset = %asset.name, size = asset.len(), "Below threshold, skipping");
            return (TaskOutcome::Skipped(SkipReason::TooSmall), None);
        }

        let (output, resolution) = match self.resolve_output(&asset).await {
            Ok(resolved) => resolved,
            Err(error) => {
                let message = error.to_string();
                tracing::error!(asset = %asset.name, algorithm = %config.algorithm.identity(), error = %message, "Compression failed");
                compilation.report_error(error);
                return (TaskOutcome::Failed(message), None);
            }
        };

        let ratio = output.len() as f64 / asset.len() as f64;
        if ratio > config.min_ratio {
            tracing::debug!(
                asset = %asset.name,
                size = asset.len(),
                compressed = output.len(),
                ratio,
                "Compression ratio rejected"
            );
            return (TaskOutcome::Skipped(SkipReason::RatioRejected), Some(resolution));
        }

        let destination = config.filename.resolve(&asset.name);
        let outcome = match self.emit(compilation, asset, &destination, output) {
            Ok(()) => TaskOutcome::Emitted(destination),
            Err(error) => {
                let message = error.to_string();
                compilation.report_error(error);
                TaskOutcome::Failed(message)
            }
        };

        (outcome, Some(resolution))
    }

    /// Find the output in the session cache, then the persistent cache,
    /// and compress only if both miss. With caching disabled every call
    /// compresses.
    async fn resolve_output(&self, asset: &Asset) -> Result<(Bytes, Resolution), SqueezeError> {
        let config = self.config;

        if config.cache.is_enabled()
            && let Some(output) = self.session.get(&self.scope, &asset.name, &asset.content)
        {
            tracing::debug!(asset = %asset.name, "Session cache hit");
            return Ok((output, Resolution::Session));
        }

        let key = CacheKey::new(&asset.name, &config.algorithm, &asset.content);

        if let Some(output) = config.cache.get(&key).await {
            tracing::debug!(asset = %asset.name, key = %key, "Cache hit");
            self.remember(asset, &output);
            return Ok((output, Resolution::Cache));
        }

        let output = config
            .algorithm
            .compress(asset.content.clone())
            .await
            .map_err(|source| SqueezeError::Compression {
                asset: asset.name.clone(),
                source,
            })?;

        tracing::debug!(
            asset = %asset.name,
            algorithm = %config.algorithm.identity(),
            size = asset.len(),
            compressed = output.len(),
            "Compressed asset"
        );

        config.cache.store(&key, output.clone()).await;
        self.remember(asset, &output);

        Ok((output, Resolution::Compressed))
    }

    fn remember(&self, asset: &Asset, output: &Bytes) {
        if !self.config.cache.is_enabled() {
            return;
        }

        self.session
            .insert(&self.scope, &asset.name, asset.content.clone(), output.clone());
    }

    /// Publish the derivative and update or remove the original.
    ///
    /// On error the asset set is left as it was.
    fn emit(
        &self,
        compilation: &dyn Compilation,
        original: Asset,
        destination: &str,
        output: Bytes,
    ) -> Result<(), SqueezeError> {
        let config = self.config;
        let info = AssetInfo::compressed()
            .with_immutable(original.info.immutable && config.filename.embeds_original_name());

        match config.delete_original_assets {
            DeleteOriginalAssets::Keep => {
                let previous = compilation.get_asset(destination);
                compilation.emit_asset(destination, output, info)?;

                let mut related_info = original.info.clone();
                related_info
                    .related
                    .insert(config.relation_label.clone(), destination);

                if let Err(e) =
                    compilation.update_asset(&original.name, original.content.clone(), related_info)
                {
                    tracing::warn!(asset = %original.name, derivative = %destination, "Relating original failed, rolling back derivative");
                    match previous {
                        Some(previous) => {
                            if let Err(restore) =
                                compilation.update_asset(destination, previous.content, previous.info)
                            {
                                tracing::warn!(asset = %destination, error = %restore, "Restoring previous derivative failed");
                            }
                        }
                        None => {
                            compilation.delete_asset(destination);
                        }
                    }
                    return Err(e.into());
                }
            }
            mode @ (DeleteOriginalAssets::Delete | DeleteOriginalAssets::KeepSourceMap) => {
                if mode == DeleteOriginalAssets::KeepSourceMap
                    && original.info.related.source_map.is_some()
                {
                    let mut info = original.info.clone();
                    info.related.source_map = None;
                    compilation.update_asset(&original.name, original.content.clone(), info)?;
                }

                compilation.delete_asset(&original.name);

                if let Err(e) = compilation.emit_asset(destination, output, info) {
                    tracing::warn!(asset = %original.name, derivative = %destination, "Emit failed, restoring original");
                    if let Err(restore) =
                        compilation.emit_asset(&original.name, original.content, original.info)
                    {
                        tracing::warn!(asset = %original.name, error = %restore, "Restoring original failed");
                        compilation.report_warning(format!(
                            "Could not restore {} after a failed emit: {}",
                            original.name, restore
                        ));
                    }
                    return Err(e.into());
                }
            }
        }

        tracing::debug!(asset = %original.name, derivative = %destination, "Emitted compressed asset");
        Ok(())
    }
}
