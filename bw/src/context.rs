//! Process-wide context shared by the accumulator and the workflow engine

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::WorkflowError;

/// Validated configuration plus the resolved repository location
///
/// Built once at startup and shared through an `Arc`.
#[derive(Debug, Clone)]
pub struct AppContext {
    config: Config,
    repo_path: PathBuf,
    protected: BTreeSet<String>,
}

impl AppContext {
    /// Validate `config` and resolve the repository path (`repo_override` wins)
    pub fn new(config: Config, repo_override: Option<PathBuf>) -> Result<Self, WorkflowError> {
        config.validate()?;

        let repo_path = repo_override.unwrap_or_else(|| config.repository.local_path.clone());
        let protected = config.branch_protection.protected_branches.iter().cloned().collect();
        debug!(?repo_path, ?protected, "AppContext::new: validated");

        Ok(Self {
            config,
            repo_path,
            protected,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    pub fn protected_branches(&self) -> &BTreeSet<String> {
        &self.protected
    }

    pub fn is_protected(&self, branch: &str) -> bool {
        self.protected.contains(branch)
    }
}
