//! Filesystem change notifications

use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Kind of mutation observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
}

/// One observed filesystem mutation, consumed immediately by the accumulator
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// Absolute path of the changed entry
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub is_directory: bool,
    pub observed_at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            kind,
            is_directory,
            observed_at: Utc::now(),
        }
    }

    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Created, false)
    }

    pub fn modified(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Modified, false)
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self::new(path, ChangeKind::Modified, true)
    }
}
