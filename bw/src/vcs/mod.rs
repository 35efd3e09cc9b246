//! Version-control and hosting CLI plumbing
//!
//! All git and gh invocations go through the CommandRunner trait so the
//! workflow engine can be driven by a scripted runner in tests.

mod hooks;
mod runner;

#[cfg(test)]
pub(crate) mod fake;

pub use hooks::{HOOK_MARKER, HookInstall, install_hooks};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
