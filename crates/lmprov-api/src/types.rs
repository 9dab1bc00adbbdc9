// Wire types for the LogicMonitor REST API (v3).
//
// Only the fields provisioning reads or writes are modelled; unknown
// response fields are ignored.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Envelopes ────────────────────────────────────────────────────────

/// A page of a list response: `{ "total": n, "items": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub items: Vec<T>,
}

// ── Groups ───────────────────────────────────────────────────────────

/// A group of any kind as returned by the portal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteGroup {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub full_path: Option<String>,
    /// Member devices, present on device groups only.
    #[serde(default)]
    pub devices: Vec<ItemRef>,
}

/// Minimal projection of any listed item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// A name/value property pair (device group custom properties,
/// website group properties).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: String,
}

/// Creation payload shared by every group kind. Fields that a kind does
/// not carry are left empty and skipped on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupCreation {
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applies_to: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_properties: Vec<Property>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<Property>,
}

// ── Dashboards ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub widgets_config: serde_json::Value,
    #[serde(default)]
    pub widgets_order: Option<String>,
}

/// Body of `POST dashboard/dashboards/{id}/clone`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCloneRequest {
    pub name: String,
    pub description: String,
    pub group_id: i64,
    pub widgets_config: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub widgets_order: Option<String>,
}

// ── Netscans ─────────────────────────────────────────────────────────

/// Port list applied when a netscan does not specify its own.
pub const DEFAULT_NETSCAN_PORTS: &str = "21,22,23,25,53,69,80,81,110,123,135,143,389,443,445,631,993,1433,1521,3306,3389,5432,5672,6081,7199,8000,8080,8081,9100,10000,11211,27017";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum NetscanMethod {
    #[default]
    Nmap,
    Nec2,
    Script,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum NetscanAssignmentType {
    #[default]
    Default,
    Matching,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NetscanInclusionType {
    #[default]
    Include,
    Exclude,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetscanCredentials {
    pub device_group_id: i64,
    pub device_group_name: String,
    pub custom: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetscanAssignment {
    #[serde(rename = "type")]
    pub kind: NetscanAssignmentType,
    pub device_group_id: i64,
    pub device_group_name: String,
    pub disable_alerting: bool,
    pub inclusion_type: NetscanInclusionType,
    pub query: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetscanDdr {
    pub change_name: String,
    pub assignment: Vec<NetscanAssignment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetscanSchedule {
    pub notify: bool,
    #[serde(rename = "type")]
    pub kind: String,
    pub recipients: Vec<String>,
    pub cron: String,
    pub timezone: String,
}

impl Default for NetscanSchedule {
    fn default() -> Self {
        Self {
            notify: false,
            kind: "manual".into(),
            recipients: Vec::new(),
            cron: String::new(),
            timezone: "America/New_York".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetscanDuplicates {
    #[serde(rename = "type")]
    pub kind: String,
    pub groups: Vec<i64>,
    pub collectors: Vec<i64>,
}

impl Default for NetscanDuplicates {
    fn default() -> Self {
        Self {
            kind: "1".into(),
            groups: Vec::new(),
            collectors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetscanPorts {
    pub is_global_default: bool,
    pub value: String,
}

impl Default for NetscanPorts {
    fn default() -> Self {
        Self {
            is_global_default: true,
            value: DEFAULT_NETSCAN_PORTS.into(),
        }
    }
}

/// Body of `POST setting/netscans`.
///
/// The nested sections start out absent and are filled with portal
/// defaults the first time any of them is touched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetscanCreation {
    pub name: String,
    pub description: String,
    #[serde(rename = "collector")]
    pub collector_id: String,
    pub method: NetscanMethod,
    #[serde(rename = "subnet")]
    pub subnet_scan_range: String,
    pub group_id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub exclude: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<NetscanCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ddr: Option<NetscanDdr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<NetscanSchedule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<NetscanDuplicates>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ports: Option<NetscanPorts>,
}

impl NetscanCreation {
    /// Fill every absent nested section with its default, including a
    /// single include-type DDR assignment.
    pub fn prepare(&mut self) {
        self.credentials.get_or_insert_with(NetscanCredentials::default);
        let ddr = self.ddr.get_or_insert_with(NetscanDdr::default);
        if ddr.assignment.is_empty() {
            ddr.assignment.push(NetscanAssignment::default());
        }
        self.schedule.get_or_insert_with(NetscanSchedule::default);
        self.duplicate.get_or_insert_with(NetscanDuplicates::default);
        self.ports.get_or_insert_with(NetscanPorts::default);
    }
}

// ── Roles ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PrivilegeObjectType {
    #[serde(rename = "host_group")]
    #[strum(serialize = "host_group")]
    DeviceGroup,
    DashboardGroup,
    Map,
    ReportGroup,
    WebsiteGroup,
    Setting,
    Help,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum PrivilegeOperation {
    #[default]
    None,
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RolePrivilege {
    pub object_type: PrivilegeObjectType,
    pub object_id: String,
    pub operation: PrivilegeOperation,
}

/// Body of `POST setting/roles`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCreation {
    pub name: String,
    pub description: String,
    #[serde(rename = "requireEULA")]
    pub require_eula: bool,
    #[serde(rename = "twoFARequired")]
    pub two_fa_required: bool,
    pub custom_help_label: String,
    #[serde(rename = "customHelpURL")]
    pub custom_help_url: String,
    pub role_group_id: i64,
    pub privileges: Vec<RolePrivilege>,
}
