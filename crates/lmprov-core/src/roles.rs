// ── Role assembly ──
//
// After every tree of a row is reconciled, each enabled role
// configuration is rebuilt from scratch: same-named roles in the row's
// role group are deleted, then a role is created whose privileges point
// at the group ids the reconciler left in scope.

use lmprov_api::types::{PrivilegeObjectType, PrivilegeOperation, RoleCreation, RolePrivilege};
use lmprov_api::{Filter, GroupKind};
use tracing::{debug, info};

use crate::error::CoreError;
use crate::expr::evaluate_as;
use crate::model::{Mode, RoleConfiguration};
use crate::scope::VariableScope;
use crate::service::ResourceService;

/// Where a privilege's object id comes from.
enum ObjectSource {
    /// The scope value under this key, verbatim.
    Scope(&'static str),
    /// `prefix` followed by the scope value under `key`.
    Prefixed {
        prefix: &'static str,
        key: &'static str,
    },
    /// `role.{roleGroupId}`.
    RoleGroup,
    Fixed(&'static str),
}

/// Access granted by a privilege.
enum Access {
    /// The role configuration's access level.
    Configured,
    Read,
}

/// Privileges in the order they are sent.
const PRIVILEGES: &[(PrivilegeObjectType, ObjectSource, Access)] = &[
    (PrivilegeObjectType::DeviceGroup, ObjectSource::Scope("deviceGroupId"), Access::Configured),
    (PrivilegeObjectType::DashboardGroup, ObjectSource::Scope("dashboardGroupId"), Access::Configured),
    (PrivilegeObjectType::Map, ObjectSource::Scope("topologyGroupId"), Access::Configured),
    (PrivilegeObjectType::ReportGroup, ObjectSource::Scope("reportGroupId"), Access::Configured),
    (PrivilegeObjectType::WebsiteGroup, ObjectSource::Scope("websiteGroupId"), Access::Configured),
    (
        PrivilegeObjectType::Setting,
        ObjectSource::Prefixed { prefix: "useraccess.admingroup.", key: "userGroupId" },
        Access::Configured,
    ),
    (
        PrivilegeObjectType::Setting,
        ObjectSource::Prefixed { prefix: "collectorgroup.", key: "collectorGroupId" },
        Access::Configured,
    ),
    (PrivilegeObjectType::Setting, ObjectSource::RoleGroup, Access::Read),
    (PrivilegeObjectType::Help, ObjectSource::Fixed("chat"), Access::Read),
];

/// Scope key holding the role group id roles are created in.
const ROLE_GROUP_KEY: &str = "roleGroupId";

/// Build the privilege list for `access_level`, omitting every entry
/// whose scope key is absent or null.
pub fn privileges(
    scope: &VariableScope,
    access_level: PrivilegeOperation,
    role_group_id: i64,
) -> Vec<RolePrivilege> {
    PRIVILEGES
        .iter()
        .filter_map(|(object_type, source, access)| {
            let object_id = match source {
                ObjectSource::Scope(key) => scope.get_non_null(key)?.to_string(),
                ObjectSource::Prefixed { prefix, key } => {
                    format!("{prefix}{}", scope.get_non_null(key)?)
                }
                ObjectSource::RoleGroup => format!("role.{role_group_id}"),
                ObjectSource::Fixed(id) => (*id).to_owned(),
            };
            let operation = match access {
                Access::Configured => access_level,
                Access::Read => PrivilegeOperation::Read,
            };
            Some(RolePrivilege {
                object_type: *object_type,
                object_id,
                operation,
            })
        })
        .collect()
}

/// Builds roles from the ids captured during reconciliation.
pub struct RoleAssembler<'a> {
    service: &'a dyn ResourceService,
}

impl<'a> RoleAssembler<'a> {
    pub fn new(service: &'a dyn ResourceService) -> Self {
        Self { service }
    }

    /// Replace the role of every enabled configuration. Only create mode
    /// does anything.
    pub async fn assemble(
        &self,
        mode: Mode,
        configurations: &[RoleConfiguration],
        scope: &VariableScope,
    ) -> Result<usize, CoreError> {
        if mode != Mode::Create {
            return Ok(0);
        }
        let role_group_id = scope
            .get_non_null(ROLE_GROUP_KEY)
            .and_then(|v| v.as_int())
            .unwrap_or(0);

        let mut created = 0;
        for configuration in configurations {
            let enabled: bool = evaluate_as(&configuration.condition, scope)?;
            if !enabled {
                debug!(role = %configuration.name, "role configuration disabled");
                continue;
            }
            let role = build_role(configuration, scope, role_group_id)?;

            let filter = Filter::new()
                .eq("name", role.name.as_str())
                .eq(ROLE_GROUP_KEY, role_group_id);
            for existing in self.service.list_items(GroupKind::Role, &filter).await? {
                self.service.delete_item(GroupKind::Role, existing.id).await?;
                debug!(role = %role.name, id = existing.id, "deleted existing role");
            }

            let result = self.service.create_role(&role).await?;
            info!(
                role = %role.name,
                id = result.id,
                privileges = role.privileges.len(),
                "created role"
            );
            created += 1;
        }
        Ok(created)
    }
}

fn build_role(
    configuration: &RoleConfiguration,
    scope: &VariableScope,
    role_group_id: i64,
) -> Result<RoleCreation, CoreError> {
    Ok(RoleCreation {
        name: evaluate_as(&configuration.name, scope)?,
        description: evaluate_as(&configuration.description, scope)?,
        require_eula: evaluate_as(&configuration.is_eula_required, scope)?,
        two_fa_required: evaluate_as(&configuration.is_two_factor_authentication_required, scope)?,
        custom_help_label: evaluate_as(&configuration.custom_help_label, scope)?,
        custom_help_url: evaluate_as(&configuration.custom_help_url, scope)?,
        role_group_id,
        privileges: privileges(scope, configuration.access_level, role_group_id),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::expr::Value;

    fn ids(privileges: &[RolePrivilege]) -> Vec<&str> {
        privileges.iter().map(|p| p.object_id.as_str()).collect()
    }

    #[test]
    fn full_scope_yields_every_privilege_in_order() {
        let scope: VariableScope = [
            ("deviceGroupId", Value::Int(11)),
            ("dashboardGroupId", Value::Int(12)),
            ("topologyGroupId", Value::Int(13)),
            ("reportGroupId", Value::Int(14)),
            ("websiteGroupId", Value::Int(15)),
            ("userGroupId", Value::Int(16)),
            ("collectorGroupId", Value::Int(17)),
        ]
        .into_iter()
        .collect();

        let privileges = privileges(&scope, PrivilegeOperation::Write, 3);
        assert_eq!(
            ids(&privileges),
            [
                "11",
                "12",
                "13",
                "14",
                "15",
                "useraccess.admingroup.16",
                "collectorgroup.17",
                "role.3",
                "chat",
            ]
        );
        assert_eq!(privileges[0].operation, PrivilegeOperation::Write);
        assert_eq!(privileges[7].operation, PrivilegeOperation::Read);
        assert_eq!(privileges[8].object_type, PrivilegeObjectType::Help);
    }

    #[test]
    fn absent_keys_are_omitted() {
        let scope: VariableScope = [
            ("dashboardGroupId", Value::Int(12)),
            ("deviceGroupId", Value::Null),
        ]
        .into_iter()
        .collect();

        let privileges = privileges(&scope, PrivilegeOperation::Read, 0);
        assert_eq!(ids(&privileges), ["12", "role.0", "chat"]);
        assert!(
            privileges
                .iter()
                .all(|p| p.object_type != PrivilegeObjectType::DeviceGroup)
        );
    }
}
