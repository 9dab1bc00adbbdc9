//! CLI error types with miette diagnostics.
//!
//! Maps `ConfigError` and `CoreError` into user-facing errors with
//! actionable help text and a process exit code.

use miette::Diagnostic;
use thiserror::Error;

use lmprov_config::ConfigError;
use lmprov_core::CoreError;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(lmprov::no_config),
        help("Pass --config <PATH> or create the file at the default location.")
    )]
    NoConfig { path: String },

    #[error("Could not load configuration: {message}")]
    #[diagnostic(code(lmprov::config))]
    ConfigLoad { message: String },

    #[error("Configuration is invalid:\n{issues}")]
    #[diagnostic(
        code(lmprov::validation),
        help("Fix the listed entries and run: lmprov validate")
    )]
    Validation { issues: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("No access key configured for account '{account}'")]
    #[diagnostic(
        code(lmprov::no_credentials),
        help(
            "Set LMPROV_ACCESS_KEY, name a variable with credentials.access_key_env,\n\
             or store the key in the system keyring as lmprov / {account}/access-key."
        )
    )]
    NoCredentials { account: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(lmprov::auth_failed),
        help("Verify the access id and key of the API token and the portal account name.")
    )]
    AuthFailed { message: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the portal: {reason}")]
    #[diagnostic(
        code(lmprov::connection_failed),
        help("Check network access to the portal, or base_url and ca_cert if set.")
    )]
    ConnectionFailed { reason: String },

    // ── Provisioning ─────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(lmprov::provisioning))]
    Provisioning { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(lmprov::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    #[error("Mode 'menu' needs an interactive terminal")]
    #[diagnostic(
        code(lmprov::menu_requires_terminal),
        help("Set mode = \"create\" or \"delete\" in the configuration, or run: lmprov create")
    )]
    MenuRequiresTerminal,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not render output: {message}")]
    #[diagnostic(code(lmprov::render))]
    Render { message: String },
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::NoConfig { .. }
            | Self::ConfigLoad { .. }
            | Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::MenuRequiresTerminal => exit_code::USAGE,
            Self::NoCredentials { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Provisioning { .. } | Self::Io(_) | Self::Render { .. } => exit_code::GENERAL,
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { issues } => CliError::Validation {
                issues: issues
                    .iter()
                    .map(|issue| format!("  - {issue}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            },
            ConfigError::NoCredentials { account } => CliError::NoCredentials { account },
            ConfigError::NotFound { path } => CliError::NoConfig {
                path: path.display().to_string(),
            },
            ConfigError::Figment(e) => CliError::ConfigLoad {
                message: e.to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Authentication { message } => CliError::AuthFailed { message },
            CoreError::Connection { reason } => CliError::ConnectionFailed { reason },
            CoreError::Io(e) => CliError::Io(e),
            other => CliError::Provisioning {
                message: other.to_string(),
            },
        }
    }
}
