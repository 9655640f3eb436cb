//! Build-asset compression pipeline for squeeze
//!
//! A [`CompressionPlugin`] runs once per build pass. It selects assets by
//! name rules and size, compresses each one concurrently, and emits the
//! result as a new asset next to (or instead of) the original. Results are
//! cached by content and configuration, so watch-mode rebuilds only
//! compress what changed.
//!
//! # Features
//!
//! - `gzip` - gzip, deflate and deflateRaw codecs (enabled by default)
//! - `brotli` - brotliCompress codec (enabled by default)
//! - `zstd` - zstd codec
//! - `full` - Enable all codecs
//!
//! # Example
//!
//! ```rust,no_run
//! use squeeze_core::prelude::*;
//!
//! # async fn example() -> Result<(), ConfigError> {
//! let plugin = CompressionPlugin::builder()
//!     .algorithm("brotliCompress")
//!     .test(Rule::regex(r"\.(js|css)$")?)
//!     .delete_original_assets(DeleteOriginalAssets::KeepSourceMap)
//!     .build()?;
//!
//! let compilation = InMemoryCompilation::new()
//!     .with_asset(Asset::new("app.js", "let a = 1;\n".repeat(500)));
//!
//! plugin.process_assets(&compilation).await;
//! assert!(compilation.contains("app.js.br"));
//! # Ok(())
//! # }
//! ```
//!
//! # Per-asset sequence
//!
//! 1. Skip if the original already records this plugin's derivative
//! 2. Skip if shorter than `threshold`
//! 3. Look up the output in the session cache, then the persistent cache
//! 4. Compress on a miss and store the output
//! 5. Skip if `compressed / original > min_ratio`
//! 6. Resolve the destination name
//! 7. Emit, then relate or delete the original
//!
//! Compression errors are reported on the host error channel; they never
//! abort the pass.

mod algorithm;
mod asset;
mod cache;
mod compilation;
mod config;
mod error;
mod naming;
mod options;
mod pipeline;
mod plugin;
mod rules;
mod selector;

pub use algorithm::{Algorithm, AlgorithmSpec, CompressFn, CompressFuture};
pub use asset::{Asset, AssetInfo, Related};
pub use cache::{CacheKey, CompressionCache, SessionCache};
pub use compilation::{Compilation, InMemoryCompilation, Plugin};
pub use config::{
    CacheSetting, CompressionPluginBuilder, DEFAULT_MIN_RATIO, DeleteOriginalAssets, PluginConfig,
    default_filename,
};
pub use error::{AssetError, BoxError, ConfigError, Result, SqueezeError};
pub use naming::{Filename, FilenameFn, PathData};
pub use options::{CacheOption, PluginOptions, RegexRule, RuleItem, RuleSpec};
pub use pipeline::{Resolution, SkipReason, TaskOutcome, TaskPipeline, TaskReport};
pub use plugin::{CompressionPlugin, CompressionReport};
pub use rules::{MatchRules, Rule, Rules};
pub use selector::AssetSelector;

pub use squeeze_codec::{BuiltinAlgorithm, CompressionOptions};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        AlgorithmSpec, Asset, AssetInfo, CacheSetting, Compilation, CompressionOptions,
        CompressionPlugin, CompressionReport, ConfigError, DeleteOriginalAssets, Filename,
        InMemoryCompilation, PathData, Plugin, PluginOptions, Rule, SessionCache, SkipReason,
        SqueezeError, TaskOutcome,
    };
}
