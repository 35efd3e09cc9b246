//! branchwarden - branch-per-change pull request automation
//!
//! branchwarden watches a git checkout, batches file changes by category and
//! publishes each batch as its own branch, conventional commit and pull
//! request. Protected branches (main, master by default) are never committed
//! to or pushed, whatever state the checkout is found in.
//!
//! # Modules
//!
//! - [`accumulator`] - Hash-deduplicated, per-category change batching
//! - [`workflow`] - Branch, commit, push and pull request engine
//! - [`watcher`] - Polling scanner and the long-running monitor loop
//! - [`vcs`] - git and gh subprocess plumbing plus protective hooks
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod accumulator;
pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod vcs;
pub mod watcher;
pub mod workflow;

pub use accumulator::{ChangeAccumulator, FileRecord, IgnoreSet};
pub use config::Config;
pub use context::AppContext;
pub use domain::{
    BranchType, Category, ChangeEvent, ChangeKind, UpdateRequest, WorkflowResult, WorkflowStage, WorkflowStatus,
};
pub use error::WorkflowError;
pub use vcs::{CommandRunner, ProcessRunner};
pub use watcher::{Monitor, PollingScanner, WatcherConfig};
pub use workflow::WorkflowEngine;
