//! Asset name filter rules (`test` / `include` / `exclude`)

use crate::error::ConfigError;
use regex::Regex;

/// A single name pattern
#[derive(Debug, Clone)]
pub enum Rule {
    /// Matches names starting with this string
    Prefix(String),
    /// Matches names the expression finds a match in
    Regex(Regex),
}

impl Rule {
    /// Prefix rule
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self::Prefix(prefix.into())
    }

    /// Compile a regular expression rule
    pub fn regex(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    /// Check a name against this rule
    pub fn matches(&self, name: &str) -> bool {
        match self {
            Self::Prefix(prefix) => name.starts_with(prefix.as_str()),
            Self::Regex(regex) => regex.is_match(name),
        }
    }
}

impl From<Regex> for Rule {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

impl From<&str> for Rule {
    fn from(prefix: &str) -> Self {
        Self::prefix(prefix)
    }
}

/// One or more rules, OR-combined
#[derive(Debug, Clone, Default)]
pub struct Rules(Vec<Rule>);

impl Rules {
    /// Whether any rule matches. An empty list matches nothing.
    pub fn matches(&self, name: &str) -> bool {
        self.0.iter().any(|rule| rule.matches(name))
    }

    /// Number of rules
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no rules
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Rule> for Rules {
    fn from(rule: Rule) -> Self {
        Self(vec![rule])
    }
}

impl From<Regex> for Rules {
    fn from(regex: Regex) -> Self {
        Rule::from(regex).into()
    }
}

impl From<&str> for Rules {
    fn from(prefix: &str) -> Self {
        Rule::from(prefix).into()
    }
}

impl From<Vec<Rule>> for Rules {
    fn from(rules: Vec<Rule>) -> Self {
        Self(rules)
    }
}

impl FromIterator<Rule> for Rules {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// The `test` / `include` / `exclude` triple.
///
/// A name passes when it matches `test` and `include` (each only if set)
/// and matches no `exclude` rule.
#[derive(Debug, Clone, Default)]
pub struct MatchRules {
    /// Names must match one of these
    pub test: Option<Rules>,
    /// Names must also match one of these
    pub include: Option<Rules>,
    /// Names matching any of these are rejected
    pub exclude: Option<Rules>,
}

impl MatchRules {
    /// Check a name against all three rule sets
    pub fn matches(&self, name: &str) -> bool {
        if let Some(test) = &self.test
            && !test.matches(name)
        {
            return false;
        }

        if let Some(include) = &self.include
            && !include.matches(name)
        {
            return false;
        }

        if let Some(exclude) = &self.exclude
            && exclude.matches(name)
        {
            return false;
        }

        true
    }
}
