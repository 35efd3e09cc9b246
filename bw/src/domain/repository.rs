//! Handle on the working copy being managed

use std::path::{Path, PathBuf};

/// Working-copy location plus the branch currently checked out
///
/// Created once by `WorkflowEngine::initialize_repository`. `current_branch`
/// is `None` until it has been read, and on a detached HEAD.
#[derive(Debug, Clone)]
pub struct RepositoryHandle {
    path: PathBuf,
    current_branch: Option<String>,
}

impl RepositoryHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current_branch: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_branch(&self) -> Option<&str> {
        self.current_branch.as_deref()
    }

    pub fn set_current_branch(&mut self, branch: Option<String>) {
        self.current_branch = branch;
    }
}
