//! Watcher configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the Monitor and its polling scanner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Interval between filesystem scans and flush checks, in seconds
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Minimum time between flushes, in seconds
    #[serde(default = "default_quiescence_secs")]
    pub quiescence_secs: u64,

    /// Where the path -> hash record is persisted
    #[serde(default)]
    pub state_file: Option<PathBuf>,

    /// Glob patterns (repository-relative) that never produce updates
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Install protective git hooks when monitoring starts
    #[serde(default = "default_install_hooks")]
    pub install_hooks: bool,
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_quiescence_secs() -> u64 {
    30
}

fn default_install_hooks() -> bool {
    true
}

/// VCS internals, build caches, temp/swap files and environment files
pub fn default_ignore_patterns() -> Vec<String> {
    [
        ".git/*",
        "*/.git/*",
        "__pycache__/*",
        "*/__pycache__/*",
        "node_modules/*",
        "*/node_modules/*",
        "target/*",
        "*.pyc",
        "*.log",
        "*.tmp",
        "*.swp",
        "*.DS_Store",
        ".env",
        "*/.env",
        ".env.*",
        "*/.env.*",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            quiescence_secs: default_quiescence_secs(),
            state_file: None,
            ignore_patterns: default_ignore_patterns(),
            install_hooks: default_install_hooks(),
        }
    }
}

impl WatcherConfig {
    /// Get the poll interval as a Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Get the quiescence window as a Duration
    pub fn quiescence(&self) -> Duration {
        Duration::from_secs(self.quiescence_secs)
    }

    /// Resolved hash record location
    pub fn state_file(&self) -> PathBuf {
        self.state_file
            .clone()
            .unwrap_or_else(|| crate::config::data_dir().join("file_hashes.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WatcherConfig::default();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.quiescence_secs, 30);
        assert!(config.install_hooks);
        assert!(config.ignore_patterns.iter().any(|p| p == ".git/*"));
    }

    #[test]
    fn test_durations() {
        let config = WatcherConfig {
            poll_interval_secs: 2,
            quiescence_secs: 60,
            ..Default::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.quiescence(), Duration::from_secs(60));
    }

    #[test]
    fn test_state_file_override() {
        let config = WatcherConfig {
            state_file: Some(PathBuf::from("/tmp/hashes.json")),
            ..Default::default()
        };
        assert_eq!(config.state_file(), PathBuf::from("/tmp/hashes.json"));
        assert!(WatcherConfig::default().state_file().ends_with("file_hashes.json"));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: WatcherConfig = serde_yaml::from_str("quiescence_secs: 45\n").unwrap();
        assert_eq!(config.quiescence_secs, 45);
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.ignore_patterns, default_ignore_patterns());
    }
}
