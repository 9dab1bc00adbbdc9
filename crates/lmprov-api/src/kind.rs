// Resource group kinds and their REST paths.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Every group type the portal exposes, each paired with the item
/// type that lives inside it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GroupKind {
    Collector,
    Dashboard,
    Device,
    Netscan,
    Report,
    Role,
    User,
    Topology,
    Website,
}

impl GroupKind {
    /// Path of the group collection, relative to `/santaba/rest/`.
    pub fn groups_path(self) -> &'static str {
        match self {
            Self::Collector => "setting/collector/groups",
            Self::Dashboard => "dashboard/groups",
            Self::Device => "device/groups",
            Self::Netscan => "setting/netscans/groups",
            Self::Report => "report/groups",
            Self::Role => "setting/role/groups",
            Self::User => "setting/admin/groups",
            Self::Topology => "topology/groups",
            Self::Website => "website/groups",
        }
    }

    /// Path of the item collection held by groups of this kind.
    pub fn items_path(self) -> &'static str {
        match self {
            Self::Collector => "setting/collector/collectors",
            Self::Dashboard => "dashboard/dashboards",
            Self::Device => "device/devices",
            Self::Netscan => "setting/netscans",
            Self::Report => "report/reports",
            Self::Role => "setting/roles",
            Self::User => "setting/admins",
            Self::Topology => "topology/topologies",
            Self::Website => "website/websites",
        }
    }

    /// Human-readable group type, used in log lines.
    pub fn group_label(self) -> &'static str {
        match self {
            Self::Collector => "CollectorGroup",
            Self::Dashboard => "DashboardGroup",
            Self::Device => "DeviceGroup",
            Self::Netscan => "NetscanGroup",
            Self::Report => "ReportGroup",
            Self::Role => "RoleGroup",
            Self::User => "UserGroup",
            Self::Topology => "TopologyGroup",
            Self::Website => "WebsiteGroup",
        }
    }
}
