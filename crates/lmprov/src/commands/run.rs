//! `run`, `create` and `delete`: drive provisioning runs against the portal.

use std::io::IsTerminal;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use lmprov_core::{CsvTableReader, Mode, Provisioner, RunReport};

use crate::cli::{GlobalOpts, ReportArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

const MENU: [&str; 3] = ["Create", "Delete", "Exit"];

/// Run in `forced` mode, or in the configured one when `None`.
pub async fn handle(
    forced: Option<Mode>,
    args: &ReportArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let (config, path) = util::load_validated(global)?;
    let mode = forced.unwrap_or(config.mode);
    debug!(config = %path.display(), mode = %mode, "configuration loaded");

    if mode == Mode::Menu && !std::io::stdin().is_terminal() {
        return Err(CliError::MenuRequiresTerminal);
    }
    if mode == Mode::Delete
        && !util::confirm(
            "Delete every declared group and everything in it?",
            "delete",
            global.yes,
        )?
    {
        info!("User cancelled.");
        return Ok(());
    }

    let client = config.portal_config()?.build_client()?;
    let tables = CsvTableReader::with_base_dir(util::table_dir(&path));
    let provisioner = Provisioner::new(&client, &tables, &config.blueprint);

    let cancel = CancellationToken::new();
    watch_ctrl_c(cancel.clone());

    if mode != Mode::Menu {
        let report = provisioner.run(mode, &cancel).await?;
        return print_report(&report, args, global);
    }

    loop {
        let Some(selected) = prompt_mode(&cancel).await? else {
            info!("User cancelled.");
            return Ok(());
        };
        let report = provisioner.run(selected, &cancel).await?;
        print_report(&report, args, global)?;
        if report.was_cancelled() {
            return Ok(());
        }
    }
}

/// Cancel the token on the first Ctrl+C.
fn watch_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("User cancelled.");
                cancel.cancel();
            }
            Err(e) => warn!(error = %e, "could not listen for Ctrl+C"),
        }
    });
}

/// Ask which mode to run next; `None` means exit.
async fn prompt_mode(cancel: &CancellationToken) -> Result<Option<Mode>, CliError> {
    let prompt = tokio::task::spawn_blocking(|| {
        dialoguer::Select::new()
            .with_prompt("Select mode")
            .items(&MENU)
            .default(0)
            .interact_opt()
    });

    tokio::select! {
        () = cancel.cancelled() => Ok(None),
        joined = prompt => {
            let choice = joined
                .map_err(|e| CliError::Io(std::io::Error::other(e)))?
                .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
            Ok(match choice {
                Some(0) => Some(Mode::Create),
                Some(1) => Some(Mode::Delete),
                _ => None,
            })
        }
    }
}

fn print_report(report: &RunReport, args: &ReportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color();
    let rendered = output::render(args.output, report, |r| output::report_table(r, color))?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
