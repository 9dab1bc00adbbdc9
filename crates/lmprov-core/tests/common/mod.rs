// In-memory portal shared by the core integration tests.
//
// Groups and items live in plain vectors; every trait call is appended
// to a call log so tests can assert ordering.

#![allow(dead_code, clippy::unwrap_used)]

use std::sync::Mutex;

use async_trait::async_trait;
use lmprov_api::types::{
    Dashboard, DashboardCloneRequest, GroupCreation, ItemRef, NetscanCreation, RemoteGroup,
    RoleCreation,
};
use lmprov_api::{Error, Filter, GroupKind};
use lmprov_core::{ResourceService, Structure};
use serde_json::{Value, json};

#[derive(Default)]
struct State {
    next_id: i64,
    groups: Vec<(GroupKind, RemoteGroup)>,
    items: Vec<(GroupKind, Value)>,
    dashboards: Vec<Dashboard>,
    created_groups: Vec<(GroupKind, GroupCreation)>,
    clones: Vec<(i64, DashboardCloneRequest)>,
    netscans: Vec<NetscanCreation>,
    roles: Vec<RoleCreation>,
    failing_netscans: Vec<String>,
    calls: Vec<String>,
}

impl State {
    fn allocate(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct FakePortal {
    state: Mutex<State>,
}

fn not_found(what: &str, id: i64) -> Error {
    Error::Api {
        message: format!("{what} {id} not found"),
        code: Some(1404),
        status: 404,
    }
}

impl FakePortal {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 100,
                ..State::default()
            }),
        }
    }

    // ── Seeding ─────────────────────────────────────────────────────

    /// Add a group; hierarchical roots should pass `Some(1)`.
    pub fn seed_group(&self, kind: GroupKind, name: &str, parent_id: Option<i64>) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        let full_path = full_path(&state, kind, parent_id, name);
        state.groups.push((
            kind,
            RemoteGroup {
                id,
                name: name.into(),
                description: None,
                parent_id,
                full_path: Some(full_path),
                devices: Vec::new(),
            },
        ));
        id
    }

    /// Add an item; `fields` is merged with a fresh id and `name`.
    pub fn seed_item(&self, kind: GroupKind, name: &str, fields: Value) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        let mut object = json!({ "id": id, "name": name });
        if let (Some(target), Value::Object(extra)) = (object.as_object_mut(), fields) {
            target.extend(extra);
        }
        state.items.push((kind, object));
        id
    }

    /// Add a device as a member of device group `group_id`.
    pub fn seed_device(&self, group_id: i64, name: &str) -> i64 {
        let id = self.seed_item(GroupKind::Device, name, json!({ "hostGroupIds": group_id.to_string() }));
        let mut state = self.state.lock().unwrap();
        if let Some((_, group)) = state.groups.iter_mut().find(|(_, g)| g.id == group_id) {
            group.devices.push(ItemRef {
                id,
                name: name.into(),
            });
        }
        id
    }

    pub fn seed_dashboard(&self, id: i64, name: &str, description: &str) {
        self.state.lock().unwrap().dashboards.push(Dashboard {
            id,
            name: name.into(),
            description: description.into(),
            group_id: None,
            widgets_config: json!({ "w1": { "col": 1 } }),
            widgets_order: Some("w1".into()),
        });
    }

    /// Make `create_netscan` reject the netscan called `name`.
    pub fn fail_netscan(&self, name: &str) {
        self.state.lock().unwrap().failing_netscans.push(name.into());
    }

    // ── Inspection ──────────────────────────────────────────────────

    pub fn groups(&self, kind: GroupKind) -> Vec<RemoteGroup> {
        self.state
            .lock()
            .unwrap()
            .groups
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, g)| g.clone())
            .collect()
    }

    pub fn group_named(&self, kind: GroupKind, name: &str) -> Option<RemoteGroup> {
        self.groups(kind).into_iter().find(|g| g.name == name)
    }

    pub fn items(&self, kind: GroupKind) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .items
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, v)| v.clone())
            .collect()
    }

    pub fn created_groups(&self) -> Vec<(GroupKind, GroupCreation)> {
        self.state.lock().unwrap().created_groups.clone()
    }

    pub fn clones(&self) -> Vec<(i64, DashboardCloneRequest)> {
        self.state.lock().unwrap().clones.clone()
    }

    pub fn netscans(&self) -> Vec<NetscanCreation> {
        self.state.lock().unwrap().netscans.clone()
    }

    pub fn roles(&self) -> Vec<RoleCreation> {
        self.state.lock().unwrap().roles.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that change remote state.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("list") && !c.starts_with("get"))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

fn full_path(state: &State, kind: GroupKind, parent_id: Option<i64>, name: &str) -> String {
    let parent_path = parent_id.and_then(|pid| {
        state
            .groups
            .iter()
            .find(|(k, g)| *k == kind && g.id == pid)
            .and_then(|(_, g)| g.full_path.clone())
    });
    match parent_path {
        Some(path) => format!("{path}/{name}"),
        None => name.to_owned(),
    }
}

#[async_trait]
impl ResourceService for FakePortal {
    async fn list_groups(
        &self,
        kind: GroupKind,
        filter: &Filter,
    ) -> Result<Vec<RemoteGroup>, Error> {
        self.record(format!("list_groups {kind} {filter}"));
        let state = self.state.lock().unwrap();
        Ok(state
            .groups
            .iter()
            .filter(|(k, g)| *k == kind && filter.matches(&serde_json::to_value(g).unwrap()))
            .map(|(_, g)| g.clone())
            .collect())
    }

    async fn get_group(&self, kind: GroupKind, id: i64) -> Result<RemoteGroup, Error> {
        self.record(format!("get_group {kind} {id}"));
        let state = self.state.lock().unwrap();
        state
            .groups
            .iter()
            .find(|(k, g)| *k == kind && g.id == id)
            .map(|(_, g)| g.clone())
            .ok_or_else(|| not_found("group", id))
    }

    async fn group_by_full_path(
        &self,
        kind: GroupKind,
        full_path: &str,
    ) -> Result<Option<RemoteGroup>, Error> {
        self.record(format!("get_group_by_path {kind} {full_path}"));
        let state = self.state.lock().unwrap();
        Ok(state
            .groups
            .iter()
            .find(|(k, g)| *k == kind && g.full_path.as_deref() == Some(full_path))
            .map(|(_, g)| g.clone()))
    }

    async fn create_group(
        &self,
        kind: GroupKind,
        payload: &GroupCreation,
    ) -> Result<RemoteGroup, Error> {
        self.record(format!("create_group {kind} {}", payload.name));
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        let full_path = full_path(&state, kind, payload.parent_id, &payload.name);
        let group = RemoteGroup {
            id,
            name: payload.name.clone(),
            description: Some(payload.description.clone()),
            parent_id: payload.parent_id,
            full_path: Some(full_path),
            devices: Vec::new(),
        };
        state.groups.push((kind, group.clone()));
        state.created_groups.push((kind, payload.clone()));
        Ok(group)
    }

    async fn delete_group(&self, kind: GroupKind, id: i64) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        let name = state
            .groups
            .iter()
            .find(|(k, g)| *k == kind && g.id == id)
            .map(|(_, g)| g.name.clone())
            .ok_or_else(|| not_found("group", id))?;
        state.calls.push(format!("delete_group {kind} {name}"));
        state.groups.retain(|(k, g)| !(*k == kind && g.id == id));
        Ok(())
    }

    async fn list_items(&self, kind: GroupKind, filter: &Filter) -> Result<Vec<ItemRef>, Error> {
        self.record(format!("list_items {kind} {filter}"));
        let state = self.state.lock().unwrap();
        Ok(state
            .items
            .iter()
            .filter(|(k, v)| *k == kind && filter.matches(v))
            .map(|(_, v)| serde_json::from_value(v.clone()).unwrap())
            .collect())
    }

    async fn delete_item(&self, kind: GroupKind, id: i64) -> Result<(), Error> {
        let mut state = self.state.lock().unwrap();
        let name = state
            .items
            .iter()
            .find(|(k, v)| *k == kind && v["id"] == id)
            .map(|(_, v)| v["name"].as_str().unwrap_or_default().to_owned())
            .ok_or_else(|| not_found("item", id))?;
        state.calls.push(format!("delete_item {kind} {name}"));
        state.items.retain(|(k, v)| !(*k == kind && v["id"] == id));
        for (_, group) in &mut state.groups {
            group.devices.retain(|d| d.id != id);
        }
        Ok(())
    }

    async fn get_dashboard(&self, id: i64) -> Result<Dashboard, Error> {
        self.record(format!("get_dashboard {id}"));
        let state = self.state.lock().unwrap();
        state
            .dashboards
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| not_found("dashboard", id))
    }

    async fn clone_dashboard(
        &self,
        id: i64,
        request: &DashboardCloneRequest,
    ) -> Result<Dashboard, Error> {
        self.record(format!("clone_dashboard {id} {}", request.name));
        let mut state = self.state.lock().unwrap();
        let new_id = state.allocate();
        state.items.push((
            GroupKind::Dashboard,
            json!({ "id": new_id, "name": request.name, "groupId": request.group_id }),
        ));
        state.clones.push((id, request.clone()));
        Ok(Dashboard {
            id: new_id,
            name: request.name.clone(),
            description: request.description.clone(),
            group_id: Some(request.group_id),
            widgets_config: request.widgets_config.clone(),
            widgets_order: request.widgets_order.clone(),
        })
    }

    async fn create_netscan(&self, netscan: &NetscanCreation) -> Result<ItemRef, Error> {
        self.record(format!("create_netscan {}", netscan.name));
        let mut state = self.state.lock().unwrap();
        if state.failing_netscans.contains(&netscan.name) {
            return Err(Error::Api {
                message: format!("Netscan '{}' rejected", netscan.name),
                code: Some(1400),
                status: 400,
            });
        }
        let id = state.allocate();
        state.items.push((
            GroupKind::Netscan,
            json!({ "id": id, "name": netscan.name, "groupId": netscan.group_id }),
        ));
        state.netscans.push(netscan.clone());
        Ok(ItemRef {
            id,
            name: netscan.name.clone(),
        })
    }

    async fn create_role(&self, role: &RoleCreation) -> Result<ItemRef, Error> {
        self.record(format!("create_role {}", role.name));
        let mut state = self.state.lock().unwrap();
        let id = state.allocate();
        state.items.push((
            GroupKind::Role,
            json!({ "id": id, "name": role.name, "roleGroupId": role.role_group_id }),
        ));
        state.roles.push(role.clone());
        Ok(ItemRef {
            id,
            name: role.name.clone(),
        })
    }
}

// ── Builders ────────────────────────────────────────────────────────

pub fn structure(name: &str) -> Structure {
    Structure {
        name: name.into(),
        ..Structure::default()
    }
}

pub fn with_groups(mut parent: Structure, groups: Vec<Structure>) -> Structure {
    parent.groups = groups;
    parent
}
