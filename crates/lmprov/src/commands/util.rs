//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use lmprov_config::{Config, config_path, load_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Path from `--config`, or the platform default.
pub fn resolve_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the configuration, apply command-line overrides and validate.
pub fn load_validated(global: &GlobalOpts) -> Result<(Config, PathBuf), CliError> {
    let path = resolve_config_path(global);
    let mut config = load_config(&path)?;

    if let Some(ref account) = global.account {
        config.credentials.account.clone_from(account);
    }
    if let Some(ref access_id) = global.access_id {
        config.credentials.access_id.clone_from(access_id);
    }
    if let Some(timeout) = global.timeout {
        config.timeout = timeout;
    }

    config.validate()?;
    Ok((config, path))
}

/// Directory that relative table locators resolve against.
pub fn table_dir(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_resolve_next_to_the_config_file() {
        assert_eq!(
            table_dir(Path::new("/etc/lmprov/config.toml")),
            PathBuf::from("/etc/lmprov")
        );
        assert_eq!(table_dir(Path::new("config.toml")), PathBuf::from("."));
    }
}
