// ── Per-group-kind rules ──
//
// Identity, creation payload and child enumeration differ by group kind.
// Each kind gets one `TypePolicy`, resolved once per tree from the
// registry instead of branching on the kind at every call site.

use std::collections::HashMap;

use lmprov_api::types::{GroupCreation, Property, RemoteGroup};
use lmprov_api::{Filter, GroupKind};
use tracing::debug;

use crate::error::CoreError;
use crate::service::ResourceService;

/// Parent id the portal uses for top-level groups of hierarchical kinds.
pub const ROOT_GROUP_ID: i64 = 1;

/// Which creation field, if any, receives a structure's properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyCarrier {
    None,
    /// `customProperties` (device groups).
    Custom,
    /// `properties` (website groups).
    Website,
}

/// How the items inside a group are found before the group is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildEnumerator {
    /// Items whose `field` equals the group id.
    GroupField(&'static str),
    /// Items whose set-valued `field` includes the group id. An item in
    /// several groups is deleted through whichever is removed first.
    Membership(&'static str),
    /// The member list already carried on the listed group.
    LoadedMembers,
    /// Deleting this kind's items is not supported.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypePolicy {
    pub kind: GroupKind,
    /// Scope variable that receives the resolved group id.
    pub scope_key: &'static str,
    /// Identity includes the parent id; creation carries it.
    pub hierarchical: bool,
    pub properties: PropertyCarrier,
    /// Creation carries an `appliesTo` expression.
    pub applies_to: bool,
    pub children: ChildEnumerator,
}

impl TypePolicy {
    fn flat(kind: GroupKind, scope_key: &'static str, children: ChildEnumerator) -> Self {
        Self {
            kind,
            scope_key,
            hierarchical: false,
            properties: PropertyCarrier::None,
            applies_to: false,
            children,
        }
    }

    /// Filter matching the one remote group a structure corresponds to.
    pub fn identity_filter(&self, name: &str, parent_id: Option<i64>) -> Filter {
        let filter = Filter::new().eq("name", name);
        if self.hierarchical {
            filter.eq("parentId", parent_id.unwrap_or(ROOT_GROUP_ID))
        } else {
            filter
        }
    }

    /// Build the creation payload for this kind, dropping whatever the
    /// kind does not carry.
    pub fn creation_payload(
        &self,
        name: String,
        description: String,
        properties: Vec<Property>,
        applies_to: Option<String>,
        parent_id: Option<i64>,
    ) -> GroupCreation {
        let mut payload = GroupCreation {
            name,
            description,
            ..GroupCreation::default()
        };
        if self.hierarchical {
            payload.parent_id = Some(parent_id.unwrap_or(ROOT_GROUP_ID));
        }
        if self.applies_to {
            payload.applies_to = Some(applies_to.unwrap_or_default());
        }
        match self.properties {
            PropertyCarrier::Custom => payload.custom_properties = properties,
            PropertyCarrier::Website => payload.properties = properties,
            PropertyCarrier::None if !properties.is_empty() => {
                debug!(kind = %self.kind, "{} groups carry no properties; ignoring", self.kind);
            }
            PropertyCarrier::None => {}
        }
        payload
    }

    /// Ids of the items to delete before `group` itself.
    pub async fn child_item_ids(
        &self,
        service: &dyn ResourceService,
        group: &RemoteGroup,
    ) -> Result<Vec<i64>, CoreError> {
        let filter = match self.children {
            ChildEnumerator::GroupField(field) => Filter::new().eq(field, group.id),
            ChildEnumerator::Membership(field) => Filter::new().includes(field, group.id),
            ChildEnumerator::LoadedMembers => {
                return Ok(group.devices.iter().map(|d| d.id).collect());
            }
            ChildEnumerator::Unsupported => {
                return Err(CoreError::unsupported(format!(
                    "deleting the items of {} groups",
                    self.kind.group_label()
                )));
            }
        };
        let items = service.list_items(self.kind, &filter).await?;
        Ok(items.into_iter().map(|i| i.id).collect())
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Lookup from group kind to its policy.
#[derive(Debug, Clone, Default)]
pub struct TypePolicyRegistry {
    policies: HashMap<GroupKind, TypePolicy>,
}

impl TypePolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The policies of every kind the portal supports.
    pub fn standard() -> Self {
        Self::new()
            .with(TypePolicy::flat(
                GroupKind::Collector,
                "collectorGroupId",
                ChildEnumerator::GroupField("collectorGroupId"),
            ))
            .with(TypePolicy {
                kind: GroupKind::Dashboard,
                scope_key: "dashboardGroupId",
                hierarchical: true,
                properties: PropertyCarrier::None,
                applies_to: false,
                children: ChildEnumerator::GroupField("groupId"),
            })
            .with(TypePolicy {
                kind: GroupKind::Device,
                scope_key: "deviceGroupId",
                hierarchical: true,
                properties: PropertyCarrier::Custom,
                applies_to: true,
                children: ChildEnumerator::LoadedMembers,
            })
            .with(TypePolicy::flat(
                GroupKind::Netscan,
                "netscanGroupId",
                ChildEnumerator::GroupField("groupId"),
            ))
            .with(TypePolicy::flat(
                GroupKind::Report,
                "reportGroupId",
                ChildEnumerator::GroupField("groupId"),
            ))
            .with(TypePolicy::flat(
                GroupKind::Role,
                "roleGroupId",
                ChildEnumerator::GroupField("roleGroupId"),
            ))
            .with(TypePolicy::flat(
                GroupKind::User,
                "userGroupId",
                ChildEnumerator::Membership("adminGroupIds"),
            ))
            .with(TypePolicy::flat(
                GroupKind::Topology,
                "topologyGroupId",
                ChildEnumerator::Unsupported,
            ))
            .with(TypePolicy {
                kind: GroupKind::Website,
                scope_key: "websiteGroupId",
                hierarchical: true,
                properties: PropertyCarrier::Website,
                applies_to: false,
                children: ChildEnumerator::GroupField("groupId"),
            })
    }

    /// Register (or replace) the policy for `policy.kind`.
    pub fn with(mut self, policy: TypePolicy) -> Self {
        self.policies.insert(policy.kind, policy);
        self
    }

    pub fn get(&self, kind: GroupKind) -> Result<&TypePolicy, CoreError> {
        self.policies
            .get(&kind)
            .ok_or_else(|| CoreError::unsupported(format!("{} groups", kind.group_label())))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn standard_registry_covers_every_kind() {
        let registry = TypePolicyRegistry::standard();
        for kind in GroupKind::iter() {
            assert_eq!(registry.get(kind).unwrap().kind, kind);
        }
    }

    #[test]
    fn unknown_kinds_are_fatal() {
        let err = TypePolicyRegistry::new().get(GroupKind::Device).unwrap_err();
        assert!(matches!(err, CoreError::Unsupported { .. }));
    }

    #[test]
    fn hierarchical_identity_includes_parent() {
        let registry = TypePolicyRegistry::standard();
        let device = registry.get(GroupKind::Device).unwrap();
        assert_eq!(
            device.identity_filter("Acme", None).to_query(),
            r#"name:"Acme",parentId:1"#
        );
        assert_eq!(
            device.identity_filter("Acme", Some(12)).to_query(),
            r#"name:"Acme",parentId:12"#
        );

        let report = registry.get(GroupKind::Report).unwrap();
        assert_eq!(
            report.identity_filter("Acme", Some(12)).to_query(),
            r#"name:"Acme""#
        );
    }

    #[test]
    fn payload_carries_only_kind_fields() {
        let registry = TypePolicyRegistry::standard();
        let props = || {
            vec![Property {
                name: "customer.id".into(),
                value: "42".into(),
            }]
        };

        let device = registry.get(GroupKind::Device).unwrap().creation_payload(
            "Acme".into(),
            String::new(),
            props(),
            None,
            Some(5),
        );
        assert_eq!(device.parent_id, Some(5));
        assert_eq!(device.applies_to.as_deref(), Some(""));
        assert_eq!(device.custom_properties, props());
        assert!(device.properties.is_empty());

        let website = registry.get(GroupKind::Website).unwrap().creation_payload(
            "Acme".into(),
            String::new(),
            props(),
            None,
            None,
        );
        assert_eq!(website.parent_id, Some(ROOT_GROUP_ID));
        assert_eq!(website.properties, props());
        assert!(website.applies_to.is_none());

        let role = registry.get(GroupKind::Role).unwrap().creation_payload(
            "Acme".into(),
            String::new(),
            props(),
            Some("true()".into()),
            Some(5),
        );
        assert_eq!(role.parent_id, None);
        assert_eq!(role.applies_to, None);
        assert!(role.custom_properties.is_empty());
    }
}
