//! Clap derive structures for the `lmprov` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lmprov -- declarative provisioning for LogicMonitor portals
#[derive(Debug, Parser)]
#[command(
    name = "lmprov",
    version,
    about = "Provision LogicMonitor portals from a declarative configuration",
    long_about = "Reconciles the group trees declared in a configuration file against a\n\
        LogicMonitor portal: device, dashboard, netscan, report, website, role,\n\
        user and collector groups, cloned dashboards, imported netscans and\n\
        customer roles. Runs once per row of an optional CSV repetition source.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, env = "LMPROV_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Portal account name (overrides the configuration)
    #[arg(long, env = "LMPROV_ACCOUNT", global = true)]
    pub account: Option<String>,

    /// API access id (overrides the configuration)
    #[arg(long, env = "LMPROV_ACCESS_ID", global = true, hide_env = true)]
    pub access_id: Option<String>,

    /// Request timeout in seconds (overrides the configuration)
    #[arg(long, env = "LMPROV_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

// ── Commands ─────────────────────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run in the configured mode (menu prompts for create or delete)
    Run(ReportArgs),

    /// Create or update every declared group, item and role
    Create(ReportArgs),

    /// Delete every declared group and its contents
    Delete(ReportArgs),

    /// Load and check the configuration without contacting the portal
    #[command(alias = "check")]
    Validate(ReportArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Output format
    #[arg(long, short = 'o', default_value = "table")]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
