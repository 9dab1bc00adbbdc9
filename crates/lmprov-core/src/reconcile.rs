// ── Structure reconciler ──
//
// Walks one declared structure tree against the portal. Create resolves
// or creates each group parent-first and threads its id into the scope
// under the kind's scope key; delete tears the tree down children-first
// (grandchildren, children, items, then the group itself).
//
// Remote calls are strictly sequential: later siblings and the role pass
// read scope entries written by earlier nodes.

use async_recursion::async_recursion;
use lmprov_api::GroupKind;
use lmprov_api::types::{DashboardCloneRequest, Property, RemoteGroup};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::expr::{Evaluated, Value, evaluate, evaluate_as, evaluate_outcome, try_evaluate_field};
use crate::import::ItemImporter;
use crate::model::{ItemSpec, ItemSpecType, Mode, Structure};
use crate::policy::{TypePolicy, TypePolicyRegistry};
use crate::scope::VariableScope;
use crate::service::ResourceService;
use crate::table::TableReader;

pub struct Reconciler<'a> {
    service: &'a dyn ResourceService,
    registry: &'a TypePolicyRegistry,
    importer: ItemImporter<'a>,
    cancel: &'a CancellationToken,
}

impl<'a> Reconciler<'a> {
    pub fn new(
        service: &'a dyn ResourceService,
        registry: &'a TypePolicyRegistry,
        tables: &'a dyn TableReader,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            service,
            registry,
            importer: ItemImporter::new(service, tables),
            cancel,
        }
    }

    /// Reconcile a root structure of `kind`.
    ///
    /// Returns the resolved group id, or `None` when the tree was disabled
    /// or (in delete mode) absent.
    pub async fn reconcile_tree(
        &self,
        mode: Mode,
        kind: GroupKind,
        structure: &Structure,
        scope: &mut VariableScope,
    ) -> Result<Option<i64>, CoreError> {
        if mode == Mode::Menu {
            return Err(CoreError::configuration(
                "mode must be create or delete when reconciling",
            ));
        }
        let policy = self.registry.get(kind)?;
        let parent = self.root_parent(policy, structure, scope).await?;
        self.reconcile(mode, policy, structure, scope, parent.as_ref())
            .await
    }

    /// Resolve the root's `parent` full path, if one is declared.
    async fn root_parent(
        &self,
        policy: &TypePolicy,
        structure: &Structure,
        scope: &VariableScope,
    ) -> Result<Option<RemoteGroup>, CoreError> {
        let Some(expression) = structure.parent.as_deref() else {
            return Ok(None);
        };
        let path = required_string(expression, scope, "parent")?;
        if !policy.hierarchical {
            warn!(kind = %policy.kind, parent = %path, "{} groups do not nest; ignoring parent", policy.kind);
            return Ok(None);
        }
        let parent = self
            .service
            .group_by_full_path(policy.kind, &path)
            .await?
            .ok_or_else(|| {
                CoreError::configuration(format!(
                    "parent {} '{path}' does not exist",
                    policy.kind.group_label()
                ))
            })?;
        debug!(kind = %policy.kind, parent = %path, id = parent.id, "resolved root parent");
        Ok(Some(parent))
    }

    #[async_recursion]
    async fn reconcile(
        &self,
        mode: Mode,
        policy: &TypePolicy,
        structure: &Structure,
        scope: &mut VariableScope,
        parent: Option<&RemoteGroup>,
    ) -> Result<Option<i64>, CoreError> {
        if self.cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }

        let enabled: bool = evaluate_as(&structure.condition, scope)?;
        if !enabled {
            info!(
                kind = %policy.kind,
                condition = %structure.condition,
                "Not processing {}: disabled",
                policy.kind.group_label()
            );
            return Ok(None);
        }

        let name = required_string(&structure.name, scope, "name")?;
        info!(kind = %policy.kind, name = %name, "Processing {}", policy.kind.group_label());
        let parent_id = parent.map(|p| p.id);
        let existing = self.find(policy, &name, parent_id).await?;

        match mode {
            Mode::Delete => {
                let Some(group) = existing else {
                    debug!(kind = %policy.kind, name = %name, "group absent; nothing to delete");
                    return Ok(None);
                };
                for child in &structure.groups {
                    ensure_no_parent(child)?;
                    scope.set(policy.scope_key, group.id);
                    self.reconcile(mode, policy, child, scope, Some(&group))
                        .await?;
                }
                for item in policy.child_item_ids(self.service, &group).await? {
                    self.service.delete_item(policy.kind, item).await?;
                    debug!(kind = %policy.kind, id = item, "deleted item");
                }
                self.service.delete_group(policy.kind, group.id).await?;
                info!(kind = %policy.kind, name = %name, id = group.id, "deleted group");
                Ok(Some(group.id))
            }
            Mode::Create => {
                let group = match existing {
                    Some(group) => {
                        debug!(kind = %policy.kind, name = %name, id = group.id, "group exists");
                        group
                    }
                    None => {
                        let group = self
                            .create_group(policy, structure, scope, name, parent_id)
                            .await?;
                        self.clone_items(policy, &group, &structure.items, scope)
                            .await?;
                        group
                    }
                };
                for child in &structure.groups {
                    ensure_no_parent(child)?;
                    scope.set(policy.scope_key, group.id);
                    self.reconcile(mode, policy, child, scope, Some(&group))
                        .await?;
                }
                scope.set(policy.scope_key, group.id);
                self.importer
                    .import(policy, &group, &structure.items, scope)
                    .await?;
                Ok(Some(group.id))
            }
            Mode::Menu => Err(CoreError::configuration(
                "mode must be create or delete when reconciling",
            )),
        }
    }

    /// The single remote group matching `name` (and parent, for
    /// hierarchical kinds).
    async fn find(
        &self,
        policy: &TypePolicy,
        name: &str,
        parent_id: Option<i64>,
    ) -> Result<Option<RemoteGroup>, CoreError> {
        let filter = policy.identity_filter(name, parent_id);
        let mut matches = self.service.list_groups(policy.kind, &filter).await?;
        match matches.len() {
            0 | 1 => Ok(matches.pop()),
            count => Err(CoreError::Ambiguous {
                kind: policy.kind.group_label().to_owned(),
                name: name.to_owned(),
                count,
            }),
        }
    }

    async fn create_group(
        &self,
        policy: &TypePolicy,
        structure: &Structure,
        scope: &VariableScope,
        name: String,
        parent_id: Option<i64>,
    ) -> Result<RemoteGroup, CoreError> {
        let description = required_string(&structure.description, scope, "description")?;
        let properties = structure
            .properties
            .iter()
            .map(|(key, expression)| {
                Ok(Property {
                    name: key.clone(),
                    value: evaluate(expression, scope)?.to_string(),
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;
        let applies_to = match structure.applies_to.as_deref() {
            Some(expression) if policy.applies_to => {
                Some(evaluate_as::<String>(expression, scope)?)
            }
            _ => None,
        };

        let payload =
            policy.creation_payload(name, description, properties, applies_to, parent_id);
        let group = self.service.create_group(policy.kind, &payload).await?;
        info!(kind = %policy.kind, name = %group.name, id = group.id, "created group");
        Ok(group)
    }

    /// Create the single items declared on a newly created group.
    async fn clone_items(
        &self,
        policy: &TypePolicy,
        group: &RemoteGroup,
        items: &[ItemSpec],
        scope: &VariableScope,
    ) -> Result<(), CoreError> {
        for spec in items {
            match spec.kind {
                ItemSpecType::CloneSingleFromId if policy.kind == GroupKind::Dashboard => {
                    self.clone_dashboard(group, spec, scope).await?;
                }
                ItemSpecType::CloneSingleFromId | ItemSpecType::ConfigSingle => {
                    return Err(CoreError::unsupported(format!(
                        "{} items in {} groups",
                        spec.kind,
                        policy.kind.group_label()
                    )));
                }
                ItemSpecType::XlsxMulti => {}
            }
        }
        Ok(())
    }

    async fn clone_dashboard(
        &self,
        group: &RemoteGroup,
        spec: &ItemSpec,
        scope: &VariableScope,
    ) -> Result<(), CoreError> {
        let template_id = template_id(spec, scope)?;
        let name: String = try_evaluate_field(&spec.fields, "Name", scope)?.ok_or_else(|| {
            CoreError::configuration(format!(
                "cloning dashboard {template_id} requires a Name field that evaluates to a string"
            ))
        })?;
        let template = self.service.get_dashboard(template_id).await?;
        let description = try_evaluate_field(&spec.fields, "Description", scope)?
            .unwrap_or_else(|| template.description.clone());

        let request = DashboardCloneRequest {
            name,
            description,
            group_id: group.id,
            widgets_config: template.widgets_config,
            widgets_order: template.widgets_order,
        };
        let clone = self.service.clone_dashboard(template_id, &request).await?;
        info!(
            template = template_id,
            name = %clone.name,
            id = clone.id,
            group = group.id,
            "cloned dashboard"
        );
        Ok(())
    }
}

fn required_string(
    expression: &str,
    scope: &VariableScope,
    what: &str,
) -> Result<String, CoreError> {
    match evaluate_outcome::<String>(expression, scope)? {
        Evaluated::Value(s) => Ok(s),
        Evaluated::Fallback { actual } => Err(CoreError::configuration(format!(
            "{what} '{expression}' evaluated to a {} ({actual}), expected a string",
            actual.type_name()
        ))),
    }
}

fn ensure_no_parent(child: &Structure) -> Result<(), CoreError> {
    match &child.parent {
        Some(parent) => Err(CoreError::configuration(format!(
            "parent '{parent}' is only allowed on a root structure"
        ))),
        None => Ok(()),
    }
}

/// The template id of a clone spec: an integer, or text holding one.
fn template_id(spec: &ItemSpec, scope: &VariableScope) -> Result<i64, CoreError> {
    let expression = spec
        .config
        .as_deref()
        .ok_or_else(|| CoreError::configuration("clone item spec has no config"))?;
    match evaluate(expression, scope)? {
        Value::Int(id) => Ok(id),
        Value::Str(s) => s.trim().parse().map_err(|_| {
            CoreError::configuration(format!(
                "clone config '{expression}' evaluated to '{s}', expected an integer id"
            ))
        }),
        other => Err(CoreError::configuration(format!(
            "clone config '{expression}' evaluated to a {} ({other}), expected an integer id",
            other.type_name()
        ))),
    }
}
