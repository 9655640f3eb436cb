//! Candidate selection

use crate::asset::Asset;
use crate::compilation::Compilation;
use crate::rules::MatchRules;

/// Picks the assets a pass should try to compress.
#[derive(Debug, Clone, Default)]
pub struct AssetSelector {
    rules: MatchRules,
    threshold: u64,
}

impl AssetSelector {
    /// Create a selector
    pub fn new(rules: MatchRules, threshold: u64) -> Self {
        Self { rules, threshold }
    }

    /// Minimum content length, in bytes
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Whether an asset name passes the rules.
    ///
    /// Content and flags are not consulted.
    pub fn matches_name(&self, name: &str) -> bool {
        self.rules.matches(name)
    }

    /// Collect candidates from the host in name order
    pub fn select(&self, compilation: &dyn Compilation) -> Vec<Asset> {
        let mut names = compilation.asset_names();
        names.sort();

        names
            .into_iter()
            .filter(|name| self.rules.matches(name))
            .filter_map(|name| compilation.get_asset(&name))
            .filter(|asset| {
                if asset.info.compressed {
                    tracing::trace!(asset = %asset.name, "Skipping compressed asset");
                    return false;
                }
                if (asset.len() as u64) < self.threshold {
                    tracing::debug!(
                        asset = %asset.name,
                        size = asset.len(),
                        threshold = self.threshold,
                        "Skipping asset below threshold"
                    );
                    return false;
                }
                true
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetInfo;
    use crate::compilation::InMemoryCompilation;
    use crate::rules::Rule;

    fn compilation() -> InMemoryCompilation {
        InMemoryCompilation::new()
            .with_asset(Asset::new("main.js", vec![b'a'; 100]))
            .with_asset(Asset::new("style.css", vec![b'b'; 10]))
            .with_asset(Asset::new("logo.png", vec![b'c'; 500]))
            .with_asset(
                Asset::new("main.js.gz", vec![b'd'; 50]).with_info(AssetInfo::compressed()),
            )
    }

    fn names(assets: &[Asset]) -> Vec<&str> {
        assets.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_compressed_assets_never_selected() {
        let selector = AssetSelector::default();
        let selected = selector.select(&compilation());
        assert_eq!(names(&selected), vec!["logo.png", "main.js", "style.css"]);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let selector = AssetSelector::new(MatchRules::default(), 100);
        let selected = selector.select(&compilation());
        assert_eq!(names(&selected), vec!["logo.png", "main.js"]);
    }

    #[test]
    fn test_rules_filter_names() {
        let rules = MatchRules {
            test: Some(Rule::regex(r"\.(js|css)$").unwrap().into()),
            exclude: Some(Rule::prefix("style").into()),
            ..Default::default()
        };
        let selector = AssetSelector::new(rules, 0);
        assert_eq!(names(&selector.select(&compilation())), vec!["main.js"]);
    }
}
