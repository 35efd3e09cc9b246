use std::fs;
use std::path::Path;
use std::sync::Arc;

use branchwarden::cli::{Cli, Command, OutputFormat, check_required_tools};
use branchwarden::config::Config;
use branchwarden::context::AppContext;
use branchwarden::vcs::{HookInstall, ProcessRunner, install_hooks};
use branchwarden::{Monitor, WorkflowEngine, WorkflowResult};
use clap::{CommandFactory, Parser};
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info, warn};

/// Set up file logging with priority: CLI --log-level > config file > INFO
fn setup_logging(cli_log_level: Option<&str>, config_log_level: &str, log_file: &Path) -> Result<()> {
    if let Some(log_dir) = log_file.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    let level_str = cli_log_level.unwrap_or(config_log_level);
    let level = match level_str.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", level_str);
            tracing::Level::INFO
        }
    };

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Resolves on SIGINT or SIGTERM (ctrl-c elsewhere)
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut sigint), Ok(mut sigterm)) => {
                tokio::select! {
                    _ = sigint.recv() => info!("SIGINT received, shutting down"),
                    _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
                }
            }
            _ => {
                warn!("Failed to install signal handlers, falling back to ctrl-c");
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!(error = %e, "ctrl-c handler failed");
                }
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "ctrl-c handler failed");
        }
    }
}

fn print_result(result: &WorkflowResult, format: &OutputFormat) -> Result<()> {
    if *format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    let status = if result.is_success() {
        result.status.to_string().green().bold()
    } else {
        result.status.to_string().red().bold()
    };
    println!("{} {}({})", status, result.commit_type, result.scope);
    println!("  Branch: {}", result.branch.as_deref().unwrap_or("-").cyan());
    if let Some(url) = &result.pr_url {
        println!("  Pull request: {}", url.cyan());
    }
    if let Some(err) = result.error_message() {
        println!("  Error: {}", err.red());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), &config.logging.level, &config.logging.log_file())
        .context("Failed to setup logging")?;

    let ctx = Arc::new(AppContext::new(config, cli.repo).context("Invalid configuration")?);
    info!(repo = %ctx.repo_path().display(), "branchwarden started");

    debug!(?command, "main: dispatching command");
    match command {
        Command::Monitor => {
            let runner = Arc::new(ProcessRunner::new(ctx.config().tools.timeout()));
            let monitor = Monitor::new(ctx.clone(), runner)?;
            println!(
                "{} {} (ctrl-c to stop)",
                "Monitoring".green().bold(),
                ctx.repo_path().display()
            );
            monitor.run(shutdown_signal()).await?;
            println!("{}", "Stopped".yellow());
        }
        Command::Update {
            description,
            paths,
            category,
            format,
        } => {
            let runner = Arc::new(ProcessRunner::new(ctx.config().tools.timeout()));
            let mut engine = WorkflowEngine::new(ctx.clone(), runner);
            let result = engine.process_update(&category, &paths, &description).await;
            print_result(&result, &format)?;
            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Command::InstallHooks => {
            let results = install_hooks(ctx.repo_path(), ctx.protected_branches())?;
            for result in results {
                match result {
                    HookInstall::Installed(path) => println!("{} {}", "installed".green(), path.display()),
                    HookInstall::SkippedForeign(path) => {
                        println!("{} {} (not managed by branchwarden)", "skipped".yellow(), path.display())
                    }
                }
            }
        }
        Command::Check => {
            let mut missing = false;
            for tool in check_required_tools(&ctx.config().tools) {
                let icon = if tool.available { "\u{2705}" } else { "\u{274C}" };
                let version = tool.version.as_deref().unwrap_or("not found");
                println!("  {} {:<10} {}", icon, tool.name, version);
                missing |= !tool.available;
            }
            println!("\nLogs are written to: {}", ctx.config().logging.log_file().display());
            if missing {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
