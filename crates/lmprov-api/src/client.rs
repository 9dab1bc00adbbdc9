// Hand-crafted async HTTP client for the LogicMonitor REST API (v3).
//
// Base path: https://{account}.logicmonitor.com/santaba/rest/
// Auth: LMv1 HMAC signature per request, `X-Version: 3`

use std::future::Future;

use reqwest::Method;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::auth::LmCredentials;
use crate::filter::Filter;
use crate::kind::GroupKind;
use crate::types::{
    Dashboard, DashboardCloneRequest, GroupCreation, ItemRef, NetscanCreation, Page, RemoteGroup,
    RoleCreation,
};
use crate::{Error, TransportConfig};

/// Items requested per page when listing.
pub const PAGE_SIZE: i64 = 300;

const API_VERSION: &str = "3";

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for a single LogicMonitor portal.
///
/// Every request is signed with the portal's LMv1 API token; the
/// signature covers the verb, timestamp, body and resource path.
pub struct LogicMonitorClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: LmCredentials,
}

impl LogicMonitorClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client for `https://{account}.logicmonitor.com/santaba/rest/`.
    pub fn new(credentials: LmCredentials, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = format!(
            "https://{}.logicmonitor.com/santaba/rest/",
            credentials.account
        );
        Self::with_base_url(&base_url, credentials, transport)
    }

    /// Build a client against an explicit base URL (proxies, test servers).
    pub fn with_base_url(
        base_url: &str,
        credentials: LmCredentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http, credentials)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        credentials: LmCredentials,
    ) -> Result<Self, Error> {
        let mut url = Url::parse(base_url)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(Self {
            http,
            base_url: url,
            credentials,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn account(&self) -> &str {
        &self.credentials.account
    }

    // ── Request plumbing ─────────────────────────────────────────────

    /// Send a signed request. `path` is relative to the REST root and is
    /// also the resource path covered by the signature.
    async fn send(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, String)],
        body: Option<String>,
    ) -> Result<reqwest::Response, Error> {
        let url = self.base_url.join(path)?;
        debug!("{method} {url} params={params:?}");

        let resource_path = format!("/{}", path.trim_start_matches('/'));
        let payload = body.as_deref().unwrap_or_default();
        let authorization =
            self.credentials
                .authorization_now(method.as_str(), &resource_path, payload)?;
        let mut auth_value =
            HeaderValue::from_str(&authorization).map_err(|e| Error::Authentication {
                message: format!("invalid authorization header value: {e}"),
            })?;
        auth_value.set_sensitive(true);

        let mut request = self
            .http
            .request(method, url)
            .header("Authorization", auth_value)
            .header("X-Version", API_VERSION);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body);
        }
        Ok(request.send().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let resp = self.send(Method::GET, path, &[], None).await?;
        self.handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let resp = self.send(Method::GET, path, params, None).await?;
        self.handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let body = serde_json::to_string(body).map_err(|e| Error::Deserialization {
            message: format!("could not encode request body: {e}"),
            body: String::new(),
        })?;
        let resp = self.send(Method::POST, path, &[], Some(body)).await?;
        self.handle_response(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), Error> {
        let resp = self.send(Method::DELETE, path, &[], None).await?;
        self.handle_empty(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<ErrorResponse>(&raw).ok();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Error::Authentication {
                message: parsed
                    .and_then(|e| e.error_message)
                    .unwrap_or_else(|| status.to_string()),
            };
        }

        match parsed {
            Some(err) => Error::Api {
                status: status.as_u16(),
                message: err.error_message.unwrap_or_else(|| status.to_string()),
                code: err.error_code,
            },
            None => Error::Api {
                status: status.as_u16(),
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    raw
                },
                code: None,
            },
        }
    }

    // ── Pagination helper ────────────────────────────────────────────

    /// Collect all pages into a single `Vec<T>`.
    pub async fn paginate_all<T, F, Fut>(&self, size: i64, fetch: F) -> Result<Vec<T>, Error>
    where
        F: Fn(i64, i64) -> Fut,
        Fut: Future<Output = Result<Page<T>, Error>>,
    {
        let mut all = Vec::new();
        let mut offset: i64 = 0;

        loop {
            let page = fetch(offset, size).await?;
            let received = i64::try_from(page.items.len()).unwrap_or(i64::MAX);
            all.extend(page.items);

            if received < size || i64::try_from(all.len()).unwrap_or(i64::MAX) >= page.total {
                break;
            }

            offset += received;
        }

        Ok(all)
    }

    async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: &Filter,
    ) -> Result<Vec<T>, Error> {
        self.paginate_all(PAGE_SIZE, |offset, size| {
            let mut params = vec![("offset", offset.to_string()), ("size", size.to_string())];
            if !filter.is_empty() {
                params.push(("filter", filter.to_query()));
            }
            async move { self.get_with_params(path, &params).await }
        })
        .await
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    // ── Groups ───────────────────────────────────────────────────────

    pub async fn list_groups(
        &self,
        kind: GroupKind,
        filter: &Filter,
    ) -> Result<Vec<RemoteGroup>, Error> {
        self.list_all(kind.groups_path(), filter).await
    }

    pub async fn get_group(&self, kind: GroupKind, id: i64) -> Result<RemoteGroup, Error> {
        self.get(&format!("{}/{id}", kind.groups_path())).await
    }

    /// Look up a group by its full path (`Customers/Acme`).
    pub async fn group_by_full_path(
        &self,
        kind: GroupKind,
        full_path: &str,
    ) -> Result<Option<RemoteGroup>, Error> {
        let filter = Filter::new().eq("fullPath", full_path);
        Ok(self.list_groups(kind, &filter).await?.into_iter().next())
    }

    pub async fn create_group(
        &self,
        kind: GroupKind,
        payload: &GroupCreation,
    ) -> Result<RemoteGroup, Error> {
        self.post(kind.groups_path(), payload).await
    }

    pub async fn delete_group(&self, kind: GroupKind, id: i64) -> Result<(), Error> {
        self.delete(&format!("{}/{id}", kind.groups_path())).await
    }

    // ── Items ────────────────────────────────────────────────────────

    /// List the items (dashboards, netscans, roles, ...) of a group kind.
    pub async fn list_items(&self, kind: GroupKind, filter: &Filter) -> Result<Vec<ItemRef>, Error> {
        self.list_all(kind.items_path(), filter).await
    }

    pub async fn delete_item(&self, kind: GroupKind, id: i64) -> Result<(), Error> {
        self.delete(&format!("{}/{id}", kind.items_path())).await
    }

    // ── Dashboards ───────────────────────────────────────────────────

    pub async fn get_dashboard(&self, id: i64) -> Result<Dashboard, Error> {
        self.get(&format!("dashboard/dashboards/{id}")).await
    }

    pub async fn clone_dashboard(
        &self,
        id: i64,
        request: &DashboardCloneRequest,
    ) -> Result<Dashboard, Error> {
        self.post(&format!("dashboard/dashboards/{id}/clone"), request)
            .await
    }

    // ── Netscans ─────────────────────────────────────────────────────

    pub async fn create_netscan(&self, netscan: &NetscanCreation) -> Result<ItemRef, Error> {
        self.post("setting/netscans", netscan).await
    }

    // ── Roles ────────────────────────────────────────────────────────

    pub async fn create_role(&self, role: &RoleCreation) -> Result<ItemRef, Error> {
        self.post("setting/roles", role).await
    }
}
