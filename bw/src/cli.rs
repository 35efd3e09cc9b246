//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::ToolsConfig;

/// branchwarden - every change on its own branch, every branch a pull request
#[derive(Parser)]
#[command(
    name = "bw",
    about = "Watch a checkout and turn changes into branches, commits and pull requests",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Repository checkout, overrides repository.local_path
    #[arg(short, long, global = true)]
    pub repo: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch the checkout and open a pull request per batch of changes
    Monitor,

    /// Run one update through the workflow right now
    Update {
        /// Commit and pull request description
        description: String,

        /// Repository-relative paths to commit
        #[arg(required = true)]
        paths: Vec<String>,

        /// Category (feature, docs, config, fix)
        #[arg(short = 't', long, default_value = "feature")]
        category: String,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Install pre-commit and pre-push hooks that block protected branches
    InstallHooks,

    /// Report whether git and gh are available
    Check,
}

/// Result of checking a required tool
pub struct ToolCheck {
    pub name: String,
    pub available: bool,
    pub version: Option<String>,
}

impl ToolCheck {
    /// Check if a tool is available and get its version
    pub fn check(name: &str, version_args: &[&str]) -> Self {
        debug!(name, ?version_args, "ToolCheck::check: called");
        let result = std::process::Command::new(name).args(version_args).output();

        match result {
            Ok(output) if output.status.success() => {
                debug!(name, "ToolCheck::check: tool available");
                let version_str = String::from_utf8_lossy(&output.stdout);
                Self {
                    name: name.to_string(),
                    available: true,
                    version: Some(parse_version(&version_str)),
                }
            }
            _ => {
                debug!(name, "ToolCheck::check: tool not available");
                Self {
                    name: name.to_string(),
                    available: false,
                    version: None,
                }
            }
        }
    }
}

/// Parse version from command output (extracts first version-like string)
fn parse_version(output: &str) -> String {
    for word in output.split_whitespace() {
        let word = word.trim_start_matches('v');
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            let version: String = word.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
            if !version.is_empty() {
                return version;
            }
        }
    }
    "unknown".to_string()
}

/// Check the configured git and gh binaries
pub fn check_required_tools(tools: &ToolsConfig) -> Vec<ToolCheck> {
    debug!(git = %tools.git, gh = %tools.gh, "check_required_tools: called");
    vec![
        ToolCheck::check(&tools.git, &["--version"]),
        ToolCheck::check(&tools.gh, &["--version"]),
    ]
}

/// Output format for update results
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["bw"]);
        assert!(cli.command.is_none());
        assert!(cli.repo.is_none());
    }

    #[test]
    fn test_cli_parse_monitor_with_globals() {
        let cli = Cli::parse_from(["bw", "monitor", "-c", "/tmp/bw.yml", "-l", "debug", "--repo", "/srv/repo"]);
        assert!(matches!(cli.command, Some(Command::Monitor)));
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/bw.yml")));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.repo, Some(PathBuf::from("/srv/repo")));
    }

    #[test]
    fn test_cli_parse_update() {
        let cli = Cli::parse_from(["bw", "update", "Update docs", "docs/a.md", "docs/b.md", "-t", "docs"]);
        match cli.command {
            Some(Command::Update {
                description,
                paths,
                category,
                format,
            }) => {
                assert_eq!(description, "Update docs");
                assert_eq!(paths, vec!["docs/a.md", "docs/b.md"]);
                assert_eq!(category, "docs");
                assert_eq!(format, OutputFormat::Text);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_update_defaults_to_feature() {
        let cli = Cli::parse_from(["bw", "update", "Add x", "x.rs", "--format", "json"]);
        assert!(matches!(
            cli.command,
            Some(Command::Update { ref category, format: OutputFormat::Json, .. }) if category == "feature"
        ));
    }

    #[test]
    fn test_cli_update_requires_paths() {
        assert!(Cli::try_parse_from(["bw", "update", "Add x"]).is_err());
    }

    #[test]
    fn test_cli_parse_hooks_and_check() {
        assert!(matches!(Cli::parse_from(["bw", "install-hooks"]).command, Some(Command::InstallHooks)));
        assert!(matches!(Cli::parse_from(["bw", "check"]).command, Some(Command::Check)));
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("git version 2.43.0\n"), "2.43.0");
        assert_eq!(parse_version("gh version 2.40.1 (2024-01-01)"), "2.40.1");
        assert_eq!(parse_version("v1.2.3"), "1.2.3");
        assert_eq!(parse_version("no digits here"), "unknown");
    }

    #[test]
    fn test_output_format() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_tool_check_missing_binary() {
        let check = ToolCheck::check("branchwarden-no-such-tool", &["--version"]);
        assert!(!check.available);
        assert!(check.version.is_none());
    }
}
