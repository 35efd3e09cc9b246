//! Update requests and workflow outcomes

use serde::{Deserialize, Serialize};

/// One logical update: a category, the affected paths and a description
///
/// `category` is the caller-facing name; the engine maps it to a branch type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRequest {
    pub category: String,
    pub paths: Vec<String>,
    pub description: String,
}

impl UpdateRequest {
    pub fn new(category: impl Into<String>, paths: Vec<String>, description: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            paths,
            description: description.into(),
        }
    }
}

/// Last step of the workflow that completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Init,
    BranchCreated,
    Committed,
    Pushed,
    PrCreated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Success,
    Failed,
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Outcome of processing one UpdateRequest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowResult {
    /// Branch created for the update, if the workflow got that far
    pub branch: Option<String>,
    pub commit_type: String,
    pub scope: String,
    pub pr_url: Option<String>,
    pub status: WorkflowStatus,
    pub stage: WorkflowStage,
    pub error: Option<String>,
}

impl WorkflowResult {
    /// A fresh result, failed until the final step succeeds
    pub fn new(commit_type: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            branch: None,
            commit_type: commit_type.into(),
            scope: scope.into(),
            pr_url: None,
            status: WorkflowStatus::Failed,
            stage: WorkflowStage::Init,
            error: None,
        }
    }

    pub fn advance(&mut self, stage: WorkflowStage) {
        self.stage = stage;
    }

    pub fn succeed(&mut self, pr_url: String) {
        self.pr_url = Some(pr_url);
        self.stage = WorkflowStage::PrCreated;
        self.status = WorkflowStatus::Success;
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = WorkflowStatus::Failed;
        self.error = Some(message.into());
    }

    pub fn is_success(&self) -> bool {
        self.status == WorkflowStatus::Success
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
