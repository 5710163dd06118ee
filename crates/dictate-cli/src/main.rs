mod commands;
mod error;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{completions, email, handle, time, Context};
use crate::error::{exit_code_for, report_error};
use dictate_config as config;

#[derive(Debug, Parser)]
#[command(
    name = "dictate",
    version,
    about = "Normalize dictated email addresses and date/time phrases"
)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Normalize a spoken email address
    Email(email::EmailArgs),
    /// Resolve a spoken date/time phrase to an ISO-8601 timestamp
    Time(time::TimeArgs),
    /// Answer a JSON normalize request
    Handle(handle::HandleArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let verbose = cli.verbose;
    init_logging(verbose);
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err, verbose);
            exit_code_for(&err)
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let Cli {
        config: config_path,
        json,
        verbose,
        command,
    } = cli;

    if let Command::Completions(args) = command {
        return completions::emit(args);
    }

    let app_config = config::load(config_path.clone()).with_context(|| "load config")?;
    if verbose {
        match config::resolve_config_path(config_path) {
            Ok(path) => {
                if path.exists() {
                    debug!(path = %path.display(), "config resolved");
                } else {
                    debug!(path = %path.display(), "config missing, using defaults");
                }
            }
            Err(err) => {
                debug!(error = %err, "config unavailable");
            }
        }
        debug!(
            fallback_tz = %app_config.fallback_tz,
            auth = app_config.auth.token.is_some(),
            "config loaded"
        );
    }

    let ctx = Context {
        json,
        config: &app_config,
    };

    match command {
        Command::Email(args) => email::normalize_email(&ctx, args),
        Command::Time(args) => time::resolve_time(&ctx, args),
        Command::Handle(args) => handle::handle(&ctx, args),
        Command::Completions(_) => unreachable!("completions command handled before config load"),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}
