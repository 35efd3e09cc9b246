//! Branch-based change workflow
//!
//! Turns an UpdateRequest into a feature branch, a conventional commit, a
//! push and a pull request, without ever touching a protected branch.

mod engine;
pub mod naming;

pub use engine::{AUTOMATED_LABEL, WorkflowEngine};
