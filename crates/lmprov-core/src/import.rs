// ── Bulk item import ──
//
// `XlsxMulti` item specs create one item per table row inside a resolved
// group. Rows are merged over the current scope, mapped through the
// spec's field expressions onto a creation payload, and each item fully
// replaces any same-named item already in the group.
//
// Field assignment goes through a static setter table. A field name
// missing from the table, or a value of the wrong type, aborts the whole
// import; a failed creation only skips its own row.

use lmprov_api::types::{
    NetscanAssignment, NetscanAssignmentType, NetscanCreation, NetscanMethod, RemoteGroup,
};
use lmprov_api::{Filter, GroupKind};
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::expr::{Evaluated, Value, evaluate, evaluate_outcome};
use crate::model::{ItemSpec, ItemSpecType};
use crate::policy::TypePolicy;
use crate::scope::VariableScope;
use crate::service::ResourceService;
use crate::table::{Row, SheetLocator, TableReader, pascal_case};

/// Row key that, when boolean false, excludes the row from import.
const INCLUDE_KEY: &str = "Include";

/// Label used in field-mapping errors.
const NETSCAN_TYPE: &str = "Netscan";

// ── Field setters ────────────────────────────────────────────────────

type Setter = fn(&mut NetscanCreation, &Value) -> bool;

/// How one configured field lands on the payload.
#[derive(Clone, Copy)]
enum FieldSetter {
    /// Direct assignment; `set` returns false on a type mismatch.
    Direct {
        expected: &'static str,
        set: Setter,
    },
    /// Device group id; the group's full path is looked up remotely.
    CredentialsDeviceGroup,
    /// Device group full path; resolved remotely to an id.
    AssignmentDeviceGroup,
}

const NETSCAN_FIELDS: &[(&str, FieldSetter)] = &[
    ("Name", FieldSetter::Direct { expected: "string", set: set_name }),
    ("Description", FieldSetter::Direct { expected: "string", set: set_description }),
    ("CollectorId", FieldSetter::Direct { expected: "int", set: set_collector_id }),
    ("Method", FieldSetter::Direct { expected: "NetscanMethod", set: set_method }),
    ("SubnetScanRange", FieldSetter::Direct { expected: "string", set: set_subnet }),
    ("GroupId", FieldSetter::Direct { expected: "int", set: set_group_id }),
    ("Exclude", FieldSetter::Direct { expected: "string", set: set_exclude }),
    ("Credentials.DeviceGroupId", FieldSetter::CredentialsDeviceGroup),
    ("Ddr.ChangeName", FieldSetter::Direct { expected: "string", set: set_ddr_change_name }),
    ("Ddr.Assignment[0].DeviceGroupName", FieldSetter::AssignmentDeviceGroup),
    (
        "Ddr.Assignment[0].Type",
        FieldSetter::Direct { expected: "NetscanAssignmentType", set: set_assignment_type },
    ),
];

fn set_string(target: &mut String, value: &Value) -> bool {
    match value {
        Value::Str(s) => {
            target.clone_from(s);
            true
        }
        _ => false,
    }
}

fn set_name(dto: &mut NetscanCreation, value: &Value) -> bool {
    set_string(&mut dto.name, value)
}

fn set_description(dto: &mut NetscanCreation, value: &Value) -> bool {
    set_string(&mut dto.description, value)
}

fn set_collector_id(dto: &mut NetscanCreation, value: &Value) -> bool {
    match value {
        Value::Int(id) => {
            dto.collector_id = id.to_string();
            true
        }
        // Kept as text so the row is skipped rather than the import aborted.
        Value::Str(s) => {
            dto.collector_id.clone_from(s);
            true
        }
        _ => false,
    }
}

fn set_method(dto: &mut NetscanCreation, value: &Value) -> bool {
    match value.as_str().map(str::parse::<NetscanMethod>) {
        Some(Ok(method)) => {
            dto.method = method;
            true
        }
        _ => false,
    }
}

fn set_subnet(dto: &mut NetscanCreation, value: &Value) -> bool {
    set_string(&mut dto.subnet_scan_range, value)
}

fn set_group_id(dto: &mut NetscanCreation, value: &Value) -> bool {
    match value.as_int() {
        Some(id) => {
            dto.group_id = id;
            true
        }
        None => false,
    }
}

fn set_exclude(dto: &mut NetscanCreation, value: &Value) -> bool {
    set_string(&mut dto.exclude, value)
}

fn set_ddr_change_name(dto: &mut NetscanCreation, value: &Value) -> bool {
    dto.ddr
        .as_mut()
        .is_some_and(|ddr| set_string(&mut ddr.change_name, value))
}

fn set_assignment_type(dto: &mut NetscanCreation, value: &Value) -> bool {
    let parsed = value.as_str().map(str::parse::<NetscanAssignmentType>);
    match (parsed, first_assignment(dto)) {
        (Some(Ok(kind)), Some(assignment)) => {
            assignment.kind = kind;
            true
        }
        _ => false,
    }
}

fn first_assignment(dto: &mut NetscanCreation) -> Option<&mut NetscanAssignment> {
    dto.ddr.as_mut().and_then(|ddr| ddr.assignment.first_mut())
}

// ── Importer ─────────────────────────────────────────────────────────

/// Counts for one bulk import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Creates the bulk items declared on a structure.
pub struct ItemImporter<'a> {
    service: &'a dyn ResourceService,
    tables: &'a dyn TableReader,
}

impl<'a> ItemImporter<'a> {
    pub fn new(service: &'a dyn ResourceService, tables: &'a dyn TableReader) -> Self {
        Self { service, tables }
    }

    /// Import every `XlsxMulti` spec in `items` into `group`.
    pub async fn import(
        &self,
        policy: &TypePolicy,
        group: &RemoteGroup,
        items: &[ItemSpec],
        scope: &VariableScope,
    ) -> Result<ImportSummary, CoreError> {
        let mut total = ImportSummary::default();
        for spec in items.iter().filter(|s| s.kind == ItemSpecType::XlsxMulti) {
            if policy.kind != GroupKind::Netscan {
                warn!(
                    kind = %policy.kind,
                    group = %group.name,
                    "bulk import is only supported for netscan groups; skipping"
                );
                continue;
            }
            let summary = self.import_netscans(group, spec, scope).await?;
            total.created += summary.created;
            total.skipped += summary.skipped;
            total.failed += summary.failed;
        }
        Ok(total)
    }

    async fn import_netscans(
        &self,
        group: &RemoteGroup,
        spec: &ItemSpec,
        scope: &VariableScope,
    ) -> Result<ImportSummary, CoreError> {
        let locator = sheet_locator(spec, scope)?;
        let rows = self.tables.read(&locator)?;
        debug!(group = %group.name, rows = rows.len(), "importing netscans");

        // Map every row before creating anything: a mapping error is fatal.
        let mut payloads = Vec::new();
        for row in rows {
            let row_scope = row_scope(scope, row);
            if row_scope.get(INCLUDE_KEY).and_then(Value::as_bool) == Some(false) {
                continue;
            }
            payloads.push(self.map_netscan(group, spec, &row_scope).await?);
        }

        let mut summary = ImportSummary::default();
        for payload in payloads {
            let name = payload.name.clone();
            match self.replace_netscan(payload).await {
                Ok(true) => summary.created += 1,
                Ok(false) => summary.skipped += 1,
                Err(e) => {
                    warn!(netscan = %name, error = %e, "netscan creation failed");
                    summary.failed += 1;
                }
            }
        }
        info!(
            group = %group.name,
            created = summary.created,
            skipped = summary.skipped,
            failed = summary.failed,
            "netscan import finished"
        );
        Ok(summary)
    }

    async fn map_netscan(
        &self,
        group: &RemoteGroup,
        spec: &ItemSpec,
        scope: &VariableScope,
    ) -> Result<NetscanCreation, CoreError> {
        let mut dto = NetscanCreation {
            group_id: group.id,
            ..NetscanCreation::default()
        };
        dto.prepare();

        for (field, expression) in &spec.fields {
            let setter = NETSCAN_FIELDS
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, setter)| *setter)
                .ok_or_else(|| {
                    CoreError::configuration(format!(
                        "Could not find configured property {NETSCAN_TYPE}.{field}"
                    ))
                })?;
            let value = evaluate(expression, scope)?;
            if value.is_null() {
                continue;
            }
            match setter {
                FieldSetter::Direct { expected, set } => {
                    if !set(&mut dto, &value) {
                        return Err(mismatch(expression, &value, field, expected));
                    }
                }
                FieldSetter::CredentialsDeviceGroup => {
                    let id = value
                        .as_int()
                        .ok_or_else(|| mismatch(expression, &value, field, "int"))?;
                    let device_group = self.service.get_group(GroupKind::Device, id).await?;
                    if let Some(credentials) = dto.credentials.as_mut() {
                        credentials.device_group_id = id;
                        credentials.device_group_name =
                            device_group.full_path.unwrap_or(device_group.name);
                        credentials.custom.clear();
                    }
                }
                FieldSetter::AssignmentDeviceGroup => {
                    let path = value
                        .as_str()
                        .ok_or_else(|| mismatch(expression, &value, field, "string"))?;
                    let device_group = self
                        .service
                        .group_by_full_path(GroupKind::Device, path)
                        .await?
                        .ok_or_else(|| {
                            CoreError::configuration(format!("No such device group '{path}'"))
                        })?;
                    if let Some(assignment) = first_assignment(&mut dto) {
                        assignment.device_group_id = device_group.id;
                        assignment.device_group_name = path.to_owned();
                    }
                }
            }
        }
        Ok(dto)
    }

    /// Delete a same-named netscan in the target group, then create.
    /// `Ok(false)` when the row was skipped.
    async fn replace_netscan(&self, mut payload: NetscanCreation) -> Result<bool, CoreError> {
        payload.name = payload.name.replace('/', " ");

        let filter = Filter::new()
            .eq("groupId", payload.group_id)
            .eq("name", payload.name.as_str());
        let existing = self.service.list_items(GroupKind::Netscan, &filter).await?;
        if let [item] = existing.as_slice() {
            debug!(netscan = %payload.name, id = item.id, "replacing existing netscan");
            self.service.delete_item(GroupKind::Netscan, item.id).await?;
        }

        if payload.collector_id.parse::<i64>().is_err() {
            warn!(
                netscan = %payload.name,
                collector = %payload.collector_id,
                "collector id is not an integer; skipping"
            );
            return Ok(false);
        }

        let created = self.service.create_netscan(&payload).await?;
        info!(netscan = %payload.name, id = created.id, "created netscan");
        Ok(true)
    }
}

fn sheet_locator(spec: &ItemSpec, scope: &VariableScope) -> Result<SheetLocator, CoreError> {
    let expression = spec
        .config
        .as_deref()
        .ok_or_else(|| CoreError::configuration("bulk item spec has no config"))?;
    match evaluate_outcome::<String>(expression, scope)? {
        Evaluated::Value(config) => SheetLocator::parse(&config),
        Evaluated::Fallback { actual } => Err(CoreError::configuration(format!(
            "bulk item config '{expression}' evaluated to a {} ({actual}), expected 'file|sheet'",
            actual.type_name()
        ))),
    }
}

fn row_scope(scope: &VariableScope, row: Row) -> VariableScope {
    scope.overlaid(row.into_iter().map(|(header, value)| (pascal_case(&header), value)))
}

fn mismatch(expression: &str, value: &Value, field: &str, expected: &str) -> CoreError {
    CoreError::configuration(format!(
        "'{expression}' evaluated to a {} ({value}) when setting {NETSCAN_TYPE}.{field}, which is a '{expected}'",
        value.type_name()
    ))
}
