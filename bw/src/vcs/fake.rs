//! Scripted CommandRunner used by unit tests
//!
//! Simulates just enough of git and gh to drive the workflow engine: it
//! tracks the checked-out branch and records every commit and push.

use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use super::runner::{CommandOutput, CommandRunner};

#[derive(Debug, Default)]
struct FakeState {
    branch: String,
    calls: Vec<String>,
    commits_on: Vec<String>,
    pushes_of: Vec<String>,
    failing: Vec<String>,
}

pub struct ScriptedRunner {
    state: Mutex<FakeState>,
    /// When false, `git checkout -b` reports success without switching
    honors_checkout: bool,
    gh_available: bool,
}

impl ScriptedRunner {
    pub fn on_branch(branch: &str) -> Self {
        Self {
            state: Mutex::new(FakeState {
                branch: branch.to_string(),
                ..Default::default()
            }),
            honors_checkout: true,
            gh_available: true,
        }
    }

    pub fn ignoring_checkout(mut self) -> Self {
        self.honors_checkout = false;
        self
    }

    pub fn without_gh(mut self) -> Self {
        self.gh_available = false;
        self
    }

    /// Make any command line starting with `prefix` exit non-zero
    pub fn failing(self, prefix: &str) -> Self {
        self.state.lock().unwrap().failing.push(prefix.to_string());
        self
    }

    pub fn branch(&self) -> String {
        self.state.lock().unwrap().branch.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn commits_on(&self) -> Vec<String> {
        self.state.lock().unwrap().commits_on.clone()
    }

    pub fn pushes_of(&self) -> Vec<String> {
        self.state.lock().unwrap().pushes_of.clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, program: &str, args: &[&str], _cwd: &Path) -> io::Result<CommandOutput> {
        let line = format!("{} {}", program, args.join(" "));
        let mut state = self.state.lock().unwrap();
        state.calls.push(line.clone());

        if program == "gh" && !self.gh_available {
            return Err(io::Error::new(io::ErrorKind::NotFound, "gh: not found"));
        }

        if state.failing.iter().any(|prefix| line.starts_with(prefix)) {
            return Ok(CommandOutput::failed(1, format!("scripted failure: {}", line)));
        }

        let output = match (program, args) {
            ("git", ["branch", "--show-current"]) => CommandOutput::ok(format!("{}\n", state.branch)),
            ("git", ["checkout", "-b", name, ..]) => {
                if self.honors_checkout {
                    state.branch = name.to_string();
                }
                CommandOutput::ok("")
            }
            ("git", ["commit", ..]) => {
                let branch = state.branch.clone();
                state.commits_on.push(branch);
                CommandOutput::ok("")
            }
            ("git", ["push", .., branch]) => {
                state.pushes_of.push(branch.to_string());
                CommandOutput::ok("")
            }
            ("gh", ["--version"]) => CommandOutput::ok("gh version 2.40.1 (2024-01-01)\n"),
            ("gh", ["pr", "create", ..]) => CommandOutput::ok("https://github.com/acme/widgets/pull/7\n"),
            _ => CommandOutput::ok(""),
        };
        Ok(output)
    }
}
