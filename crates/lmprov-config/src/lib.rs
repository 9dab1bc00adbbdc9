//! Configuration for the lmprov CLI.
//!
//! One TOML document holds the portal credentials, the run mode and the
//! provisioning blueprint (variables, repetition, structure trees, role
//! configurations). Loading merges defaults, the file and `LMPROV_`
//! environment variables; validation reports every problem at once; the
//! access key is resolved through env → keyring → plaintext.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lmprov_core::{
    Blueprint, ItemSpecType, Mode, PortalConfig, RepetitionType, RoleConfiguration, Structure,
};

/// Environment variable consulted for the access key after `access_key_env`.
pub const ACCESS_KEY_ENV: &str = "LMPROV_ACCESS_KEY";

const KEYRING_SERVICE: &str = "lmprov";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration:\n{}", .issues.join("\n"))]
    Validation { issues: Vec<String> },

    #[error("no access key configured for account '{account}'")]
    NoCredentials { account: String },

    #[error("config file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level configuration document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub credentials: Credentials,

    /// `create`, `delete` or `menu`.
    #[serde(default)]
    pub mode: Mode,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Override for the REST root (proxies, test servers).
    pub base_url: Option<String>,

    /// Path to an extra CA certificate.
    pub ca_cert: Option<PathBuf>,

    #[serde(flatten)]
    pub blueprint: Blueprint,
}

/// Portal API token.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Credentials {
    #[serde(default)]
    pub account: String,

    #[serde(default)]
    pub access_id: String,

    /// Access key (plaintext; prefer keyring or env var).
    pub access_key: Option<String>,

    /// Environment variable name containing the access key.
    pub access_key_env: Option<String>,
}

fn default_timeout() -> u64 {
    30
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the default config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "lmprov", "lmprov").map_or_else(
        || PathBuf::from(".").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config at `path`, overlaid with `LMPROV_*` environment
/// variables (`__` separates nested keys).
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let figment = Figment::new()
        .merge(Serialized::defaults(Config {
            timeout: default_timeout(),
            ..Config::default()
        }))
        .merge(Toml::file(path))
        .merge(Env::prefixed("LMPROV_").split("__").ignore(&["access_key"]));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Validation ──────────────────────────────────────────────────────

impl Config {
    /// Check the whole document, collecting every issue.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut issues = Vec::new();

        if self.credentials.account.trim().is_empty() {
            issues.push("credentials.account must be set".to_owned());
        }
        if self.credentials.access_id.trim().is_empty() {
            issues.push("credentials.access_id must be set".to_owned());
        }
        if self.timeout == 0 {
            issues.push("timeout must be at least 1 second".to_owned());
        }
        if let Some(base_url) = &self.base_url {
            if url::Url::parse(base_url).is_err() {
                issues.push(format!("base_url '{base_url}' is not a valid URL"));
            }
        }

        let repetition = &self.blueprint.repetition;
        let has_config = !repetition.config.trim().is_empty();
        match repetition.kind {
            RepetitionType::None if has_config => issues.push(format!(
                "repetition.config must be empty for repetition type '{}'",
                repetition.kind
            )),
            RepetitionType::Csv | RepetitionType::Xlsx | RepetitionType::GoogleDriveXlsx
                if !has_config =>
            {
                issues.push(format!(
                    "repetition.config must be set for repetition type '{}'",
                    repetition.kind
                ));
            }
            _ => {}
        }

        for (_, key, tree) in self.blueprint.trees() {
            validate_structure(tree, key, true, &mut issues);
        }
        for (index, role) in self.blueprint.role_configurations().iter().enumerate() {
            validate_role(role, index, &mut issues);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation { issues })
        }
    }

    /// Build the portal connection settings, resolving the access key.
    pub fn portal_config(&self) -> Result<PortalConfig, ConfigError> {
        let access_key = resolve_access_key(&self.credentials)?;
        let mut portal = PortalConfig::new(
            self.credentials.account.clone(),
            self.credentials.access_id.clone(),
            access_key,
        );
        portal.base_url.clone_from(&self.base_url);
        portal.ca_cert.clone_from(&self.ca_cert);
        portal.timeout = Duration::from_secs(self.timeout);
        Ok(portal)
    }
}

fn validate_structure(structure: &Structure, path: &str, is_root: bool, issues: &mut Vec<String>) {
    if structure.name.trim().is_empty() {
        issues.push(format!("{path}: name must be set"));
    }
    if structure.description.trim().is_empty() {
        issues.push(format!("{path}: description must not be empty"));
    }
    if structure.condition.trim().is_empty() {
        issues.push(format!("{path}: condition must not be empty"));
    }
    if !is_root && structure.parent.is_some() {
        issues.push(format!("{path}: parent is only allowed on a root structure"));
    }
    for (name, expression) in &structure.properties {
        if expression.trim().is_empty() {
            issues.push(format!("{path}: property '{name}' has an empty expression"));
        }
    }
    for (index, item) in structure.items.iter().enumerate() {
        let needs_config = matches!(
            item.kind,
            ItemSpecType::CloneSingleFromId | ItemSpecType::XlsxMulti
        );
        if needs_config && item.config.as_deref().is_none_or(|c| c.trim().is_empty()) {
            issues.push(format!(
                "{path}.items[{index}]: {} items need a config",
                item.kind
            ));
        }
    }
    for (index, child) in structure.groups.iter().enumerate() {
        validate_structure(child, &format!("{path}.groups[{index}]"), false, issues);
    }
}

fn validate_role(role: &RoleConfiguration, index: usize, issues: &mut Vec<String>) {
    if role.name.trim().is_empty() {
        issues.push(format!("role_configurations[{index}]: name must be set"));
    }
    if role.description.trim().is_empty() {
        issues.push(format!("role_configurations[{index}]: description must be set"));
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the access key: `access_key_env` → `LMPROV_ACCESS_KEY` →
/// system keyring → plaintext.
pub fn resolve_access_key(credentials: &Credentials) -> Result<SecretString, ConfigError> {
    // 1. Configured env var
    if let Some(ref env_name) = credentials.access_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. Well-known env var
    if let Ok(val) = std::env::var(ACCESS_KEY_ENV) {
        return Ok(SecretString::from(val));
    }

    // 3. System keyring
    let keyring_user = format!("{}/access-key", credentials.account);
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &keyring_user) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref key) = credentials.access_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        account: credentials.account.clone(),
    })
}
