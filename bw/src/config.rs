//! Branchwarden configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::BranchType;
use crate::error::WorkflowError;
use crate::watcher::WatcherConfig;

/// Branch template used when no pattern is configured for a branch type
pub const FALLBACK_BRANCH_PATTERN: &str = "feature/{timestamp}-{description}";

/// Main branchwarden configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Repository location and remote
    pub repository: RepositoryConfig,

    /// Branches that must never be committed to or pushed
    pub branch_protection: BranchProtectionConfig,

    /// Branch naming, commit format and pull request options
    pub workflow_rules: WorkflowRules,

    /// Log level and file
    pub logging: LoggingConfig,

    /// Safety switches checked at startup
    pub safeguards: SafeguardsConfig,

    /// File watching and batching
    pub monitor: WatcherConfig,

    /// External CLI programs
    pub tools: ToolsConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Fails with `WorkflowError::Configuration` when the safeguards are off or
    /// the protected set or commit format are unusable.
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if !self.safeguards.prevent_main_commit {
            return Err(WorkflowError::Configuration(
                "CRITICAL: safeguards.prevent_main_commit must be enabled".to_string(),
            ));
        }

        if self.branch_protection.protected_branches.is_empty() {
            return Err(WorkflowError::Configuration(
                "branch_protection.protected_branches must name at least one branch".to_string(),
            ));
        }

        let format = &self.workflow_rules.commit_conventions.format;
        if !format.contains("{type}") || !format.contains("{description}") {
            return Err(WorkflowError::Configuration(format!(
                "workflow_rules.commit_conventions.format must contain {{type}} and {{description}}: {}",
                format
            )));
        }

        if self.tools.timeout_secs == 0 {
            return Err(WorkflowError::Configuration(
                "tools.timeout_secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: ./branchwarden.yml
        let local_config = PathBuf::from("branchwarden.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/branchwarden/branchwarden.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("branchwarden").join("branchwarden.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Repository location and remote
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// URL cloned from when the local path does not exist yet
    pub remote_url: String,

    /// Local working copy
    pub local_path: PathBuf,

    /// Remote name used for fetch and push
    pub remote: String,

    /// Base branch for new branches and pull requests
    pub default_branch: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            remote_url: String::new(),
            local_path: PathBuf::from("."),
            remote: "origin".to_string(),
            default_branch: "main".to_string(),
        }
    }
}

impl RepositoryConfig {
    /// Full remote ref new branches start from, e.g. `origin/main`
    pub fn base_ref(&self) -> String {
        format!("{}/{}", self.remote, self.default_branch)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchProtectionConfig {
    pub protected_branches: Vec<String>,
}

impl Default for BranchProtectionConfig {
    fn default() -> Self {
        Self {
            protected_branches: vec!["main".to_string(), "master".to_string()],
        }
    }
}

/// Branch naming, commit format and pull request options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowRules {
    /// `<type>_pattern` -> template with `{timestamp}` and `{description}`
    pub branch_strategy: BTreeMap<String, String>,

    pub commit_conventions: CommitConventions,

    pub pull_request: PullRequestConfig,
}

impl Default for WorkflowRules {
    fn default() -> Self {
        let branch_strategy = ["feature", "docs", "fix", "config"]
            .iter()
            .map(|ty| (format!("{}_pattern", ty), format!("{}/{{timestamp}}-{{description}}", ty)))
            .collect();

        Self {
            branch_strategy,
            commit_conventions: CommitConventions::default(),
            pull_request: PullRequestConfig::default(),
        }
    }
}

impl WorkflowRules {
    /// Branch template for a type, falling back to the feature template
    pub fn branch_pattern(&self, branch_type: BranchType) -> &str {
        self.branch_strategy
            .get(&format!("{}_pattern", branch_type.as_str()))
            .map(String::as_str)
            .unwrap_or(FALLBACK_BRANCH_PATTERN)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConventions {
    /// Template with `{type}`, `{scope}` and `{description}` placeholders
    pub format: String,
}

impl Default for CommitConventions {
    fn default() -> Self {
        Self {
            format: "{type}({scope}): {description}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PullRequestConfig {
    pub draft_by_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// TRACE, DEBUG, INFO, WARN or ERROR
    pub level: String,

    /// Log file; defaults to the local data directory
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    pub fn log_file(&self) -> PathBuf {
        self.file.clone().unwrap_or_else(default_log_path)
    }
}

/// Default log path: ~/.local/share/branchwarden/logs/branchwarden.log
pub fn default_log_path() -> PathBuf {
    data_dir().join("logs").join("branchwarden.log")
}

/// Local data directory for logs and persisted hashes
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("branchwarden")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeguardsConfig {
    /// Must stay true; startup fails otherwise
    pub prevent_main_commit: bool,
}

impl Default for SafeguardsConfig {
    fn default() -> Self {
        Self {
            prevent_main_commit: true,
        }
    }
}

/// External CLI programs and their timeout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub git: String,
    pub gh: String,
    pub timeout_secs: u64,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            gh: "gh".to_string(),
            timeout_secs: 120,
        }
    }
}

impl ToolsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
