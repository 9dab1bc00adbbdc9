// Whole-run tests: repetition rows, row isolation, role assembly.

#![allow(clippy::unwrap_used)]

mod common;

use std::fs;

use lmprov_api::GroupKind;
use lmprov_api::types::{PrivilegeObjectType, PrivilegeOperation};
use lmprov_core::expr::Value;
use lmprov_core::{Blueprint, CoreError, CsvTableReader, Mode, Provisioner, RowOutcome};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio_util::sync::CancellationToken;

use common::FakePortal;

const BLUEPRINT: &str = r#"
    [variables]
    label = "prefix + 'Customer'"
    prefix = "'LM '"

    [repetition]
    type = "csv"
    config = "'customers.csv|Customers'"

    [resources]
    name = "'Customer-' + Id"
    description = "label + ' ' + Name"

    [dashboards]
    name = "'Customer-' + Id"

    [[role_configurations]]
    name = "'Role ' + Name"
    description = "'Access for ' + Name"
    access_level = "write"

    [[role_configurations]]
    name = "'Auditor ' + Name"
    description = "''"
    condition = "Id == 44"
    access_level = "read"
"#;

const CUSTOMERS: &str = "\
Id,Name,Is Enabled
42,Acme,true
43,Globex,false
44,Initech,TRUE
";

fn setup(customers: &str) -> (tempfile::TempDir, CsvTableReader, Blueprint) {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("customers.csv"), customers).unwrap();
    let tables = CsvTableReader::with_base_dir(dir.path());
    let blueprint: Blueprint = toml::from_str(BLUEPRINT).unwrap();
    (dir, tables, blueprint)
}

#[test]
fn base_variables_may_refer_forward() {
    let (_dir, tables, blueprint) = setup(CUSTOMERS);
    let portal = FakePortal::new();

    let scope = Provisioner::new(&portal, &tables, &blueprint)
        .base_scope()
        .unwrap();

    assert_eq!(scope.get("label"), Some(&Value::from("LM Customer")));
}

#[tokio::test]
async fn runs_enabled_rows_and_skips_the_rest() {
    let (_dir, tables, blueprint) = setup(CUSTOMERS);
    let portal = FakePortal::new();

    let report = Provisioner::new(&portal, &tables, &blueprint)
        .run(Mode::Create, &CancellationToken::new())
        .await
        .unwrap();

    let outcomes: Vec<_> = report.rows.iter().map(|r| r.outcome.clone()).collect();
    assert_eq!(
        outcomes,
        [RowOutcome::Completed, RowOutcome::Skipped, RowOutcome::Completed]
    );
    assert_eq!(report.rows[0].label, "Acme");

    let devices: Vec<_> = portal
        .groups(GroupKind::Device)
        .into_iter()
        .map(|g| g.name)
        .collect();
    assert_eq!(devices, ["Customer-42", "Customer-44"]);
    assert_eq!(
        portal.created_groups()[0].1.description,
        "LM Customer Acme"
    );
}

#[tokio::test]
async fn roles_point_at_the_rows_groups() {
    let (_dir, tables, blueprint) = setup("Id,Name\n42,Acme\n");
    let portal = FakePortal::new();

    Provisioner::new(&portal, &tables, &blueprint)
        .run(Mode::Create, &CancellationToken::new())
        .await
        .unwrap();

    let device = portal.group_named(GroupKind::Device, "Customer-42").unwrap();
    let dashboard = portal.group_named(GroupKind::Dashboard, "Customer-42").unwrap();
    let roles = portal.roles();
    assert_eq!(roles.len(), 1);
    let role = &roles[0];
    assert_eq!(role.name, "Role Acme");
    assert_eq!(role.description, "Access for Acme");
    assert_eq!(role.role_group_id, 0);

    let privileges: Vec<_> = role
        .privileges
        .iter()
        .map(|p| (p.object_type, p.object_id.clone(), p.operation))
        .collect();
    assert_eq!(
        privileges,
        [
            (PrivilegeObjectType::DeviceGroup, device.id.to_string(), PrivilegeOperation::Write),
            (PrivilegeObjectType::DashboardGroup, dashboard.id.to_string(), PrivilegeOperation::Write),
            (PrivilegeObjectType::Setting, "role.0".to_owned(), PrivilegeOperation::Read),
            (PrivilegeObjectType::Help, "chat".to_owned(), PrivilegeOperation::Read),
        ]
    );
}

#[tokio::test]
async fn absent_group_ids_are_left_out_of_privileges() {
    let (_dir, tables, mut blueprint) = setup("Id,Name\n42,Acme\n");
    blueprint.resources = None;
    let portal = FakePortal::new();

    Provisioner::new(&portal, &tables, &blueprint)
        .run(Mode::Create, &CancellationToken::new())
        .await
        .unwrap();

    let role = &portal.roles()[0];
    assert!(
        role.privileges
            .iter()
            .all(|p| p.object_type != PrivilegeObjectType::DeviceGroup)
    );
    assert_eq!(role.privileges.len(), 3);
}

#[tokio::test]
async fn existing_role_is_replaced() {
    let (_dir, tables, blueprint) = setup("Id,Name\n42,Acme\n");
    let portal = FakePortal::new();
    portal.seed_item(GroupKind::Role, "Role Acme", json!({ "roleGroupId": 0 }));
    portal.seed_item(GroupKind::Role, "Role Acme", json!({ "roleGroupId": 9 }));

    Provisioner::new(&portal, &tables, &blueprint)
        .run(Mode::Create, &CancellationToken::new())
        .await
        .unwrap();

    let mutations = portal.mutations();
    let delete = mutations.iter().position(|m| m == "delete_item role Role Acme").unwrap();
    let create = mutations.iter().position(|m| m == "create_role Role Acme").unwrap();
    assert!(delete < create);
    // The role in another role group is untouched.
    assert_eq!(portal.items(GroupKind::Role).len(), 2);
}

#[tokio::test]
async fn role_condition_is_evaluated_per_row() {
    let (_dir, tables, blueprint) = setup(CUSTOMERS);
    let portal = FakePortal::new();

    Provisioner::new(&portal, &tables, &blueprint)
        .run(Mode::Create, &CancellationToken::new())
        .await
        .unwrap();

    let names: Vec<_> = portal.roles().into_iter().map(|r| r.name).collect();
    assert_eq!(names, ["Role Acme", "Role Initech", "Auditor Initech"]);
}

#[tokio::test]
async fn failing_row_does_not_stop_the_run() {
    let (_dir, tables, blueprint) = setup("Id,Name\n42,Acme\n43,Globex\n44,Initech\n");
    let portal = FakePortal::new();
    portal.seed_group(GroupKind::Device, "Customer-43", Some(1));
    portal.seed_group(GroupKind::Device, "Customer-43", Some(1));

    let report = Provisioner::new(&portal, &tables, &blueprint)
        .run(Mode::Create, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.completed(), 2);
    assert_eq!(report.failed(), 1);
    assert!(matches!(&report.rows[1].outcome, RowOutcome::Failed(reason) if reason.contains("Ambiguous")));
    assert!(portal.group_named(GroupKind::Dashboard, "Customer-44").is_some());
}

#[tokio::test]
async fn delete_mode_tears_down_and_builds_no_roles() {
    let (_dir, tables, blueprint) = setup("Id,Name\n42,Acme\n");
    let portal = FakePortal::new();
    let provisioner = Provisioner::new(&portal, &tables, &blueprint);
    provisioner
        .run(Mode::Create, &CancellationToken::new())
        .await
        .unwrap();
    portal.clear_calls();

    let report = provisioner
        .run(Mode::Delete, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.completed(), 1);
    assert!(portal.groups(GroupKind::Device).is_empty());
    assert!(portal.groups(GroupKind::Dashboard).is_empty());
    assert!(portal.mutations().iter().all(|m| !m.starts_with("create")));
}

#[tokio::test]
async fn cancellation_stops_the_row_loop() {
    let (_dir, tables, blueprint) = setup(CUSTOMERS);
    let portal = FakePortal::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = Provisioner::new(&portal, &tables, &blueprint)
        .run(Mode::Create, &cancel)
        .await
        .unwrap();

    assert!(report.was_cancelled());
    assert_eq!(report.rows.len(), 1);
    assert!(portal.calls().is_empty());
}

#[tokio::test]
async fn spreadsheet_repetition_fails_the_run() {
    let (_dir, tables, mut blueprint) = setup(CUSTOMERS);
    blueprint.repetition.kind = lmprov_core::RepetitionType::Xlsx;
    let portal = FakePortal::new();

    let err = Provisioner::new(&portal, &tables, &blueprint)
        .run(Mode::Create, &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Unsupported { .. }));
}
