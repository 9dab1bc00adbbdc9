mod cli;
mod commands;
mod error;
mod output;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use lmprov_core::Mode;

use crate::cli::{Cli, Command};
use crate::error::{CliError, exit_code};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let provisioning = matches!(
        cli.command,
        Command::Run(_) | Command::Create(_) | Command::Delete(_)
    );
    init_tracing(cli.global.verbose, cli.global.quiet, provisioning);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Application start");

    // Exit explicitly: an abandoned menu prompt may still hold a blocking thread.
    let code = match run(cli).await {
        Ok(()) => exit_code::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}

/// `RUST_LOG` wins; otherwise `-v` raises the level from warn, or from
/// info for provisioning runs.
fn init_tracing(verbosity: u8, quiet: bool, provisioning: bool) {
    const LEVELS: [&str; 4] = ["warn", "info", "debug", "trace"];
    let base = usize::from(provisioning);
    let filter = if quiet {
        "error"
    } else {
        LEVELS[(base + usize::from(verbosity)).min(LEVELS.len() - 1)]
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "lmprov", &mut std::io::stdout());
            Ok(())
        }
        Command::Validate(args) => commands::validate::handle(&args, &cli.global),
        Command::Run(args) => commands::run::handle(None, &args, &cli.global).await,
        Command::Create(args) => commands::run::handle(Some(Mode::Create), &args, &cli.global).await,
        Command::Delete(args) => commands::run::handle(Some(Mode::Delete), &args, &cli.global).await,
    }
}
