// ── Declarative provisioning model ──
//
// What the configuration file declares: one optional structure tree per
// group kind, role configurations, base variables and the repetition
// source. Every string field is an expression (see `crate::expr`).
// The model is read-only during a run; only the variable scope mutates.

use indexmap::IndexMap;
use lmprov_api::GroupKind;
use lmprov_api::types::PrivilegeOperation;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Mode ─────────────────────────────────────────────────────────────

/// What a run does to the declared trees.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Mode {
    /// Idempotent upsert of the declared tree.
    Create,
    /// Cascading teardown of an existing tree.
    Delete,
    /// Ask interactively on every run.
    #[default]
    Menu,
}

// ── Structure ────────────────────────────────────────────────────────

/// A declared group, its leaf items and its child groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Structure {
    /// Boolean expression; a false structure is skipped with its subtree.
    pub condition: String,
    pub name: String,
    pub description: String,
    /// Device groups only.
    pub applies_to: Option<String>,
    /// Full path of an existing parent group. Root structures only.
    pub parent: Option<String>,
    pub properties: IndexMap<String, String>,
    pub items: Vec<ItemSpec>,
    pub groups: Vec<Structure>,
}

impl Default for Structure {
    fn default() -> Self {
        Self {
            condition: "true".into(),
            name: String::new(),
            description: "''".into(),
            applies_to: None,
            parent: None,
            properties: IndexMap::new(),
            items: Vec::new(),
            groups: Vec::new(),
        }
    }
}

impl Structure {
    /// Number of structures in this tree, including the root.
    pub fn node_count(&self) -> usize {
        1 + self.groups.iter().map(Structure::node_count).sum::<usize>()
    }

    /// Number of item specs declared anywhere in this tree.
    pub fn item_count(&self) -> usize {
        self.items.len() + self.groups.iter().map(Structure::item_count).sum::<usize>()
    }
}

// ── Items ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ItemSpecType {
    /// An item specified entirely in configuration.
    ConfigSingle,
    /// A single item cloned from an existing one; `config` is its id.
    CloneSingleFromId,
    /// Many items imported from table rows; `config` is `file|sheet`.
    XlsxMulti,
}

/// A leaf item declaration inside a structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    #[serde(rename = "type")]
    pub kind: ItemSpecType,
    #[serde(default)]
    pub config: Option<String>,
    /// Target field name → expression.
    #[serde(default)]
    pub fields: IndexMap<String, String>,
    #[serde(default)]
    pub properties: IndexMap<String, String>,
}

// ── Roles ────────────────────────────────────────────────────────────

/// A role built after every tree of a row has been reconciled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleConfiguration {
    pub condition: String,
    pub name: String,
    pub description: String,
    /// Operation granted on every captured group.
    pub access_level: PrivilegeOperation,
    pub custom_help_label: String,
    pub custom_help_url: String,
    pub is_eula_required: String,
    pub is_two_factor_authentication_required: String,
}

impl Default for RoleConfiguration {
    fn default() -> Self {
        Self {
            condition: "true".into(),
            name: String::new(),
            description: String::new(),
            access_level: PrivilegeOperation::None,
            custom_help_label: "''".into(),
            custom_help_url: "''".into(),
            is_eula_required: "false".into(),
            is_two_factor_authentication_required: "false".into(),
        }
    }
}

// ── Repetition ───────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RepetitionType {
    /// A single run over the base variables.
    #[default]
    None,
    /// One run per CSV record; `config` is `path|sheet`.
    Csv,
    /// One run per spreadsheet row; `config` is `path|sheet`.
    Xlsx,
    /// One run per row of a Google Drive spreadsheet; `config` is `fileId|sheet`.
    GoogleDriveXlsx,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repetition {
    #[serde(rename = "type")]
    pub kind: RepetitionType,
    pub config: String,
}

// ── Blueprint ────────────────────────────────────────────────────────

/// Everything a run needs besides credentials and mode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blueprint {
    /// Name → expression, evaluated once per run before any row.
    pub variables: IndexMap<String, String>,
    pub repetition: Repetition,
    pub collectors: Option<Structure>,
    pub resources: Option<Structure>,
    pub netscans: Option<Structure>,
    pub reports: Option<Structure>,
    pub dashboards: Option<Structure>,
    pub websites: Option<Structure>,
    pub roles: Option<Structure>,
    pub users: Option<Structure>,
    pub mappings: Option<Structure>,
    pub role_configurations: Option<Vec<RoleConfiguration>>,
}

impl Blueprint {
    /// Declared trees in processing order, with their group kind and
    /// configuration key.
    pub fn trees(&self) -> impl Iterator<Item = (GroupKind, &'static str, &Structure)> {
        [
            (GroupKind::Collector, "collectors", self.collectors.as_ref()),
            (GroupKind::Device, "resources", self.resources.as_ref()),
            (GroupKind::Netscan, "netscans", self.netscans.as_ref()),
            (GroupKind::Report, "reports", self.reports.as_ref()),
            (GroupKind::Dashboard, "dashboards", self.dashboards.as_ref()),
            (GroupKind::Website, "websites", self.websites.as_ref()),
            (GroupKind::Role, "roles", self.roles.as_ref()),
            (GroupKind::User, "users", self.users.as_ref()),
            (GroupKind::Topology, "mappings", self.mappings.as_ref()),
        ]
        .into_iter()
        .filter_map(|(kind, key, tree)| tree.map(|t| (kind, key, t)))
    }

    pub fn role_configurations(&self) -> &[RoleConfiguration] {
        self.role_configurations.as_deref().unwrap_or_default()
    }
}
