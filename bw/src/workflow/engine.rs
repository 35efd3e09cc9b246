//! WorkflowEngine: branch -> commit -> push -> pull request
//!
//! Every mutating step is guarded so that nothing is ever committed on, or
//! pushed to, a protected branch. Steps are not retried; a failure stops the
//! sequence and leaves whatever was created in place for inspection.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::naming;
use crate::context::AppContext;
use crate::domain::{BranchType, RepositoryHandle, WorkflowResult, WorkflowStage, derive_scope};
use crate::error::WorkflowError;
use crate::vcs::{CommandOutput, CommandRunner};

/// Label added to every pull request alongside the branch type
pub const AUTOMATED_LABEL: &str = "automated";

/// Drives one UpdateRequest at a time through the branch workflow
pub struct WorkflowEngine {
    ctx: Arc<AppContext>,
    runner: Arc<dyn CommandRunner>,
    repo: Option<RepositoryHandle>,
}

impl WorkflowEngine {
    pub fn new(ctx: Arc<AppContext>, runner: Arc<dyn CommandRunner>) -> Self {
        debug!(repo_path = ?ctx.repo_path(), "WorkflowEngine::new: called");
        Self { ctx, runner, repo: None }
    }

    pub fn repository(&self) -> Option<&RepositoryHandle> {
        self.repo.as_ref()
    }

    pub fn current_branch(&self) -> Option<&str> {
        self.repo.as_ref().and_then(RepositoryHandle::current_branch)
    }

    /// Clone the repository if needed and set up the handle, once
    pub async fn initialize_repository(&mut self, path: &Path) -> Result<(), WorkflowError> {
        debug!(?path, "WorkflowEngine::initialize_repository: called");
        if self.repo.is_some() {
            debug!("WorkflowEngine::initialize_repository: already initialized");
            return Ok(());
        }

        if !path.exists() {
            self.clone_into(path).await?;
        } else {
            info!("Using existing repository at {}", path.display());
        }

        self.repo = Some(RepositoryHandle::new(path));
        self.ensure_not_on_protected_branch().await
    }

    async fn clone_into(&self, path: &Path) -> Result<(), WorkflowError> {
        let url = &self.ctx.config().repository.remote_url;
        if url.is_empty() {
            return Err(WorkflowError::Configuration(format!(
                "{} does not exist and repository.remote_url is not set",
                path.display()
            )));
        }

        info!("Cloning {} into {}", url, path.display());
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let target = path.to_string_lossy();
        let git = &self.ctx.config().tools.git;

        let output = self
            .runner
            .run(git, &["clone", url, &target], parent)
            .await
            .map_err(|e| WorkflowError::Clone(format!("{}: {}", git, e)))?;
        if !output.success() {
            return Err(WorkflowError::Clone(output.message().to_string()));
        }
        Ok(())
    }

    fn repo_path(&self) -> Result<&Path, WorkflowError> {
        self.repo
            .as_ref()
            .map(RepositoryHandle::path)
            .ok_or(WorkflowError::NotInitialized)
    }

    fn set_current_branch(&mut self, branch: Option<String>) {
        if let Some(repo) = self.repo.as_mut() {
            repo.set_current_branch(branch);
        }
    }

    /// Run git in the working copy; `fail` wraps spawn errors and non-zero exits
    async fn git(&self, args: &[&str], fail: fn(String) -> WorkflowError) -> Result<CommandOutput, WorkflowError> {
        let repo_path = self.repo_path()?;
        let git = &self.ctx.config().tools.git;
        let output = self
            .runner
            .run(git, args, repo_path)
            .await
            .map_err(|e| fail(format!("{} {}: {}", git, args.join(" "), e)))?;

        if !output.success() {
            debug!(?args, code = output.code, "WorkflowEngine::git: command failed");
            return Err(fail(format!(
                "{} {} exited with {}: {}",
                git,
                args.join(" "),
                output.code,
                output.message()
            )));
        }
        Ok(output)
    }

    /// Read the checked-out branch; `None` on a detached HEAD
    async fn read_current_branch(&self) -> Result<Option<String>, WorkflowError> {
        let output = self
            .git(&["branch", "--show-current"], WorkflowError::BranchCreation)
            .await?;
        let branch = output.stdout.trim();
        Ok(if branch.is_empty() { None } else { Some(branch.to_string()) })
    }

    /// Switch to a timestamped `work/` branch if a protected branch is checked out
    ///
    /// Re-reads the branch after switching and fails with `ProtectedBranch` if
    /// the switch did not take effect.
    pub async fn ensure_not_on_protected_branch(&mut self) -> Result<(), WorkflowError> {
        debug!("WorkflowEngine::ensure_not_on_protected_branch: called");
        let current = self.read_current_branch().await?;
        self.set_current_branch(current.clone());

        let Some(current) = current.filter(|b| self.ctx.is_protected(b)) else {
            return Ok(());
        };

        let escape = naming::escape_branch_name(Utc::now());
        warn!("On protected branch '{}', switching to '{}'", current, escape);
        self.git(&["checkout", "-b", &escape], WorkflowError::BranchCreation)
            .await?;

        let after = self.read_current_branch().await?;
        self.set_current_branch(after.clone());
        if let Some(branch) = after.filter(|b| self.ctx.is_protected(b)) {
            error!(%branch, "Still on protected branch after escape checkout");
            return Err(WorkflowError::ProtectedBranch(branch));
        }
        Ok(())
    }

    /// Create a branch for the update from the remote default branch tip
    pub async fn create_branch(&mut self, branch_type: BranchType, description: &str) -> Result<String, WorkflowError> {
        debug!(%branch_type, %description, "WorkflowEngine::create_branch: called");
        self.ensure_not_on_protected_branch().await?;

        let rules = &self.ctx.config().workflow_rules;
        let branch = naming::branch_name(
            rules.branch_pattern(branch_type),
            &naming::timestamp(Utc::now()),
            description,
        );
        if self.ctx.is_protected(&branch) {
            return Err(WorkflowError::ProtectedBranch(branch));
        }

        info!("Creating branch: {}", branch);
        let repository = &self.ctx.config().repository;
        self.git(&["fetch", &repository.remote], WorkflowError::BranchCreation)
            .await?;
        self.git(
            &["checkout", "-b", &branch, &repository.base_ref()],
            WorkflowError::BranchCreation,
        )
        .await?;

        self.set_current_branch(Some(branch.clone()));
        Ok(branch)
    }

    /// Stage `paths` and commit them with a conventional-commit message
    pub async fn commit(
        &mut self,
        paths: &[String],
        commit_type: &str,
        scope: &str,
        description: &str,
    ) -> Result<String, WorkflowError> {
        debug!(?paths, %commit_type, %scope, "WorkflowEngine::commit: called");
        if paths.is_empty() {
            return Err(WorkflowError::Commit("nothing to commit: no paths given".to_string()));
        }

        self.ensure_not_on_protected_branch().await?;
        if let Some(branch) = self.current_branch().filter(|b| self.ctx.is_protected(b)) {
            return Err(WorkflowError::ProtectedBranch(branch.to_string()));
        }

        let repo_path = self.repo_path()?;
        if let Some(missing) = paths.iter().find(|p| repo_path.join(p).symlink_metadata().is_err()) {
            return Err(WorkflowError::Commit(format!("{} does not exist", missing)));
        }

        for path in paths {
            self.git(&["add", "--", path], WorkflowError::Commit).await?;
        }

        let message = naming::commit_message(
            &self.ctx.config().workflow_rules.commit_conventions.format,
            commit_type,
            scope,
            description,
        );
        info!("Committing: {}", message);
        self.git(&["commit", "-m", &message], WorkflowError::Commit).await?;
        Ok(message)
    }

    /// Push the current branch, setting its upstream
    ///
    /// Checks the protected set on its own, whatever the earlier guards did.
    pub async fn push(&self) -> Result<(), WorkflowError> {
        debug!("WorkflowEngine::push: called");
        let Some(branch) = self.current_branch() else {
            return Err(WorkflowError::Push("no current branch set".to_string()));
        };

        if self.ctx.is_protected(branch) {
            error!(%branch, "BLOCKED: push to protected branch");
            return Err(WorkflowError::ProtectedBranch(branch.to_string()));
        }

        info!("Pushing branch: {}", branch);
        let remote = &self.ctx.config().repository.remote;
        self.git(&["push", "-u", remote, branch], WorkflowError::Push).await?;
        Ok(())
    }

    /// Open a pull request against the default branch
    ///
    /// `Err(ToolUnavailable)` when gh cannot be run; `Ok(None)` when gh ran
    /// but the pull request was not created.
    pub async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        labels: &[String],
    ) -> Result<Option<String>, WorkflowError> {
        debug!(%title, ?labels, "WorkflowEngine::create_pull_request: called");
        let repo_path = self.repo_path()?;
        let config = self.ctx.config();
        let gh = &config.tools.gh;

        match self.runner.run(gh, &["--version"], repo_path).await {
            Ok(output) if output.success() => {}
            Ok(output) => {
                error!("GitHub CLI ({}) is not usable: {}", gh, output.message());
                return Err(WorkflowError::ToolUnavailable(gh.clone()));
            }
            Err(e) => {
                error!("GitHub CLI ({}) not found: {}", gh, e);
                return Err(WorkflowError::ToolUnavailable(gh.clone()));
            }
        }

        let label_csv = labels.join(",");
        let mut args = vec![
            "pr",
            "create",
            "--title",
            title,
            "--body",
            body,
            "--base",
            config.repository.default_branch.as_str(),
        ];
        if !labels.is_empty() {
            args.extend(["--label", label_csv.as_str()]);
        }
        if config.workflow_rules.pull_request.draft_by_default {
            args.push("--draft");
        }

        info!("Creating pull request: {}", title);
        match self.runner.run(gh, &args, repo_path).await {
            Ok(output) if output.success() => {
                let url = output.stdout.trim().to_string();
                info!("Pull request created: {}", url);
                Ok(Some(url))
            }
            Ok(output) => {
                error!("Failed to create PR: {}", output.message());
                Ok(None)
            }
            Err(e) => {
                error!("Failed to create PR: {}", e);
                Ok(None)
            }
        }
    }

    /// Run one update through the whole workflow
    ///
    /// Never returns an error: step failures are logged and reported as a
    /// failed WorkflowResult.
    pub async fn process_update(&mut self, category: &str, paths: &[String], description: &str) -> WorkflowResult {
        info!("Processing {} update: {}", category, description);

        let branch_type = BranchType::from_category_name(category);
        let scope = derive_scope(paths);
        let mut result = WorkflowResult::new(branch_type.as_str(), scope.as_str());

        if let Err(e) = self
            .run_steps(&mut result, category, branch_type, paths, description)
            .await
        {
            if e.is_violation() {
                error!(violation = true, error = %e, "Protected branch guard tripped during {} update", category);
            } else {
                warn!(error = %e, stage = ?result.stage, "Failed to process {} update", category);
            }
            result.fail(e.to_string());
        }

        result
    }

    async fn run_steps(
        &mut self,
        result: &mut WorkflowResult,
        category: &str,
        branch_type: BranchType,
        paths: &[String],
        description: &str,
    ) -> Result<(), WorkflowError> {
        if self.repo.is_none() {
            let path = self.ctx.repo_path().to_path_buf();
            self.initialize_repository(&path).await?;
        }

        let branch = self.create_branch(branch_type, description).await?;
        result.branch = Some(branch.clone());
        result.advance(WorkflowStage::BranchCreated);

        self.commit(paths, &result.commit_type, &result.scope, description)
            .await?;
        result.advance(WorkflowStage::Committed);

        self.push().await?;
        result.advance(WorkflowStage::Pushed);

        let title = naming::commit_message(
            &self.ctx.config().workflow_rules.commit_conventions.format,
            &result.commit_type,
            &result.scope,
            description,
        );
        let body = naming::pr_body(category, &branch, paths, description);
        let labels = vec![branch_type.as_str().to_string(), AUTOMATED_LABEL.to_string()];

        match self.create_pull_request(&title, &body, &labels).await? {
            Some(url) => {
                result.succeed(url);
                Ok(())
            }
            None => {
                result.fail("pull request was not created");
                Ok(())
            }
        }
    }
}
