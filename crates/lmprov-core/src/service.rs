// The remote resource service as the reconciler sees it.
//
// `LogicMonitorClient` implements this directly; tests substitute an
// in-memory portal.

use async_trait::async_trait;
use lmprov_api::types::{
    Dashboard, DashboardCloneRequest, GroupCreation, ItemRef, NetscanCreation, RemoteGroup,
    RoleCreation,
};
use lmprov_api::{Error, Filter, GroupKind, LogicMonitorClient};

/// Typed CRUD and filtered queries against the monitoring portal.
#[async_trait]
pub trait ResourceService: Send + Sync {
    async fn list_groups(&self, kind: GroupKind, filter: &Filter)
    -> Result<Vec<RemoteGroup>, Error>;

    async fn get_group(&self, kind: GroupKind, id: i64) -> Result<RemoteGroup, Error>;

    async fn group_by_full_path(
        &self,
        kind: GroupKind,
        full_path: &str,
    ) -> Result<Option<RemoteGroup>, Error>;

    async fn create_group(
        &self,
        kind: GroupKind,
        payload: &GroupCreation,
    ) -> Result<RemoteGroup, Error>;

    async fn delete_group(&self, kind: GroupKind, id: i64) -> Result<(), Error>;

    async fn list_items(&self, kind: GroupKind, filter: &Filter) -> Result<Vec<ItemRef>, Error>;

    async fn delete_item(&self, kind: GroupKind, id: i64) -> Result<(), Error>;

    async fn get_dashboard(&self, id: i64) -> Result<Dashboard, Error>;

    async fn clone_dashboard(
        &self,
        id: i64,
        request: &DashboardCloneRequest,
    ) -> Result<Dashboard, Error>;

    async fn create_netscan(&self, netscan: &NetscanCreation) -> Result<ItemRef, Error>;

    async fn create_role(&self, role: &RoleCreation) -> Result<ItemRef, Error>;
}

#[async_trait]
impl ResourceService for LogicMonitorClient {
    async fn list_groups(
        &self,
        kind: GroupKind,
        filter: &Filter,
    ) -> Result<Vec<RemoteGroup>, Error> {
        LogicMonitorClient::list_groups(self, kind, filter).await
    }

    async fn get_group(&self, kind: GroupKind, id: i64) -> Result<RemoteGroup, Error> {
        LogicMonitorClient::get_group(self, kind, id).await
    }

    async fn group_by_full_path(
        &self,
        kind: GroupKind,
        full_path: &str,
    ) -> Result<Option<RemoteGroup>, Error> {
        LogicMonitorClient::group_by_full_path(self, kind, full_path).await
    }

    async fn create_group(
        &self,
        kind: GroupKind,
        payload: &GroupCreation,
    ) -> Result<RemoteGroup, Error> {
        LogicMonitorClient::create_group(self, kind, payload).await
    }

    async fn delete_group(&self, kind: GroupKind, id: i64) -> Result<(), Error> {
        LogicMonitorClient::delete_group(self, kind, id).await
    }

    async fn list_items(&self, kind: GroupKind, filter: &Filter) -> Result<Vec<ItemRef>, Error> {
        LogicMonitorClient::list_items(self, kind, filter).await
    }

    async fn delete_item(&self, kind: GroupKind, id: i64) -> Result<(), Error> {
        LogicMonitorClient::delete_item(self, kind, id).await
    }

    async fn get_dashboard(&self, id: i64) -> Result<Dashboard, Error> {
        LogicMonitorClient::get_dashboard(self, id).await
    }

    async fn clone_dashboard(
        &self,
        id: i64,
        request: &DashboardCloneRequest,
    ) -> Result<Dashboard, Error> {
        LogicMonitorClient::clone_dashboard(self, id, request).await
    }

    async fn create_netscan(&self, netscan: &NetscanCreation) -> Result<ItemRef, Error> {
        LogicMonitorClient::create_netscan(self, netscan).await
    }

    async fn create_role(&self, role: &RoleCreation) -> Result<ItemRef, Error> {
        LogicMonitorClient::create_role(self, role).await
    }
}
