//! Compression plugin orchestrator

use crate::cache::SessionCache;
use crate::compilation::{Compilation, Plugin};
use crate::config::{CompressionPluginBuilder, PluginConfig};
use crate::error::ConfigError;
use crate::options::PluginOptions;
use crate::pipeline::{Resolution, SkipReason, TaskOutcome, TaskPipeline, TaskReport};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;

/// Compresses the assets of each build pass.
///
/// # Examples
///
/// ```no_run
/// use squeeze_core::prelude::*;
///
/// # async fn example() -> Result<(), ConfigError> {
/// let plugin = CompressionPlugin::builder()
///     .test(Rule::regex(r"\.(js|css|html|svg)$")?)
///     .threshold(10240)
///     .min_ratio(0.8)
///     .build()?;
///
/// let compilation = InMemoryCompilation::new()
///     .with_asset(Asset::new("main.js", "console.log(1);".repeat(1000)));
///
/// let report = plugin.run(&compilation).await;
/// assert_eq!(report.emitted(), vec!["main.js.gz"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CompressionPlugin {
    config: Arc<PluginConfig>,
    session: SessionCache,
}

impl CompressionPlugin {
    /// Start building a plugin
    pub fn builder() -> CompressionPluginBuilder {
        CompressionPluginBuilder::new()
    }

    /// Plugin from deserialized options
    pub fn from_options(options: PluginOptions) -> Result<Self, ConfigError> {
        options.into_builder()?.build()
    }

    /// Plugin from a JSON options document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::from_options(PluginOptions::from_json(json)?)
    }

    /// Plugin over an existing configuration with its own session cache
    pub fn new(config: PluginConfig) -> Self {
        Self::with_session(config, SessionCache::new())
    }

    /// Plugin over an existing configuration and session cache
    pub fn with_session(config: PluginConfig, session: SessionCache) -> Self {
        Self {
            config: Arc::new(config),
            session,
        }
    }

    /// The configuration
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// The session cache
    pub fn session_cache(&self) -> &SessionCache {
        &self.session
    }

    /// Run one pass over the compilation's assets.
    ///
    /// All candidates are processed concurrently; the returned report
    /// lists every candidate's outcome.
    pub async fn run(&self, compilation: &dyn Compilation) -> CompressionReport {
        let start = Instant::now();
        let candidates = self.config.selector.select(compilation);
        let pipeline = TaskPipeline::new(&self.config, &self.session);

        let tasks = candidates
            .into_iter()
            .map(|asset| pipeline.run(compilation, asset));
        let report = CompressionReport {
            tasks: join_all(tasks).await,
        };

        tracing::info!(
            algorithm = %self.config.algorithm.identity(),
            candidates = report.len(),
            emitted = report.emitted().len(),
            skipped = report.skipped().len(),
            failed = report.failed().len(),
            cache_hits = report.cache_hits(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Compression pass complete"
        );

        report
    }
}

#[async_trait]
impl Plugin for CompressionPlugin {
    fn name(&self) -> &str {
        "CompressionPlugin"
    }

    async fn process_assets(&self, compilation: &dyn Compilation) {
        self.run(compilation).await;
    }
}

/// Outcome of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressionReport {
    tasks: Vec<TaskReport>,
}

impl CompressionReport {
    /// Per-candidate reports
    pub fn tasks(&self) -> &[TaskReport] {
        &self.tasks
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether there were no candidates
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Report for one original asset
    pub fn get(&self, asset: &str) -> Option<&TaskReport> {
        self.tasks.iter().find(|task| task.asset == asset)
    }

    /// Names of emitted derivatives, sorted
    pub fn emitted(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .tasks
            .iter()
            .filter_map(|task| match &task.outcome {
                TaskOutcome::Emitted(name) => Some(name.as_str()),
                _ => None,
            })
            .collect();
        names.sort_unstable();
        names
    }

    /// Skipped originals with the reason
    pub fn skipped(&self) -> Vec<(&str, SkipReason)> {
        self.tasks
            .iter()
            .filter_map(|task| match task.outcome {
                TaskOutcome::Skipped(reason) => Some((task.asset.as_str(), reason)),
                _ => None,
            })
            .collect()
    }

    /// Originals that failed
    pub fn failed(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|task| matches!(task.outcome, TaskOutcome::Failed(_)))
            .map(|task| task.asset.as_str())
            .collect()
    }

    /// Outputs served from the session or persistent cache
    pub fn cache_hits(&self) -> usize {
        self.count_resolved(|r| matches!(r, Resolution::Session | Resolution::Cache))
    }

    /// Outputs computed by the algorithm in this pass
    pub fn compressions(&self) -> usize {
        self.count_resolved(|r| r == Resolution::Compressed)
    }

    /// Whether no candidate failed
    pub fn is_success(&self) -> bool {
        self.failed().is_empty()
    }

    fn count_resolved(&self, pred: impl Fn(Resolution) -> bool) -> usize {
        self.tasks
            .iter()
            .filter_map(|task| task.resolution)
            .filter(|r| pred(*r))
            .count()
    }
}
