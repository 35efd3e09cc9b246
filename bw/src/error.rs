//! Workflow error types

use thiserror::Error;

/// Errors raised by configuration validation and by individual workflow steps
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Clone failed: {0}")]
    Clone(String),

    #[error("Branch creation failed: {0}")]
    BranchCreation(String),

    #[error("Commit failed: {0}")]
    Commit(String),

    #[error("BLOCKED: refusing to modify protected branch '{0}'")]
    ProtectedBranch(String),

    #[error("Required tool unavailable: {0}")]
    ToolUnavailable(String),

    #[error("Push failed: {0}")]
    Push(String),

    #[error("Repository not initialized")]
    NotInitialized,
}

impl WorkflowError {
    /// A protected-branch error means a guard was reached that should be unreachable
    pub fn is_violation(&self) -> bool {
        matches!(self, WorkflowError::ProtectedBranch(_))
    }

    /// Only configuration problems abort startup
    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkflowError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_violation() {
        assert!(WorkflowError::ProtectedBranch("main".to_string()).is_violation());
        assert!(!WorkflowError::Push("rejected".to_string()).is_violation());
        assert!(!WorkflowError::Commit("nothing to commit".to_string()).is_violation());
    }

    #[test]
    fn test_is_fatal() {
        assert!(WorkflowError::Configuration("bad".to_string()).is_fatal());
        assert!(!WorkflowError::ToolUnavailable("gh".to_string()).is_fatal());
        assert!(!WorkflowError::NotInitialized.is_fatal());
    }

    #[test]
    fn test_display() {
        let err = WorkflowError::ProtectedBranch("main".to_string());
        assert_eq!(err.to_string(), "BLOCKED: refusing to modify protected branch 'main'");

        let err = WorkflowError::ToolUnavailable("gh".to_string());
        assert_eq!(err.to_string(), "Required tool unavailable: gh");
    }
}
