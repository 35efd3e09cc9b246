//! Domain types for branchwarden
//!
//! Core values that flow from the watcher through the accumulator into the
//! workflow engine: ChangeEvent, Category, UpdateRequest, WorkflowResult.

mod category;
mod event;
mod repository;
mod update;

pub use category::{BranchType, Category, Scope, classify, derive_scope};
pub use event::{ChangeEvent, ChangeKind};
pub use repository::RepositoryHandle;
pub use update::{UpdateRequest, WorkflowResult, WorkflowStage, WorkflowStatus};
