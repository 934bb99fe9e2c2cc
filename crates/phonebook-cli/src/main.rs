mod commands;
mod error;
mod util;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

use crate::commands::{completions, contacts, shell, Context};
use crate::error::{exit_code_for, report_error};
use phonebook_client::{ClientOptions, HttpDirectory, RetryPolicy};
use phonebook_config::{self as config, AppConfig};
use phonebook_core::Directory;

#[derive(Debug, Parser)]
#[command(name = "phonebook", version, about = "phonebook CLI")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides the configured API base url
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
    List(contacts::ListArgs),
    Add(contacts::AddArgs),
    Update(contacts::UpdateArgs),
    Delete(contacts::DeleteArgs),
    /// Interactive session
    Shell(shell::ShellArgs),
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
        base_url,
        json,
        verbose,
        command,
    } = cli;

    let command = match command {
        Command::Completions(args) => return completions::emit(args),
        command => command,
    };

    let mut app_config = config::load(config_path.clone()).with_context(|| "load config")?;
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
    }
    if let Some(raw) = base_url {
        app_config.api.base_url = config::parse_base_url(&raw)?;
    }
    debug!(base_url = %app_config.api.base_url, "directory endpoint");

    let service = HttpDirectory::new(client_options(&app_config))
        .with_context(|| "build http client")?;
    let mut ctx = Context {
        directory: Directory::new(service, app_config.notification_ttl_secs),
        json,
    };

    match command {
        Command::List(args) => contacts::list_contacts(&mut ctx, args),
        Command::Add(args) => contacts::add_contact(&mut ctx, args),
        Command::Update(args) => contacts::update_contact(&mut ctx, args),
        Command::Delete(args) => contacts::delete_contact(&mut ctx, args),
        Command::Shell(args) => shell::run(&mut ctx, args),
        Command::Completions(_) => {
            unreachable!("completions command handled before client initialization")
        }
    }
}

fn client_options(app_config: &AppConfig) -> ClientOptions {
    let mut options = ClientOptions::new(app_config.api.base_url.clone());
    options.api_token = app_config.api.token.clone();
    options.timeout = app_config.api.timeout;
    options.connect_timeout = app_config.api.connect_timeout;
    options.retry = RetryPolicy {
        max_retries: app_config.retry.max_retries,
        delay: app_config.retry.delay,
        statuses: app_config.retry.statuses.clone(),
    };
    options.user_agent = Some(format!("phonebook/{}", env!("CARGO_PKG_VERSION")));
    options
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
