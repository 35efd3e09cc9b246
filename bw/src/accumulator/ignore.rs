//! Ignore patterns for paths that never produce updates

use eyre::{Context, Result};
use glob::{MatchOptions, Pattern};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    // `*` may cross directory separators, so `*.swp` matches at any depth
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Compiled set of glob patterns matched against repository-relative paths
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<Pattern>,
}

impl IgnoreSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p.as_ref()).context(format!("Invalid ignore pattern: {}", p.as_ref())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// `rel_path` uses `/` separators; directories should carry a trailing `/`
    pub fn is_ignored(&self, rel_path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches_with(rel_path, MATCH_OPTIONS))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
