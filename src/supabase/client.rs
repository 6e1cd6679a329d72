use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::error::StoreError;
use super::query::{Scope, SelectQuery, TableRef};
use super::traits::{IdentityAdmin, TableStore};
use crate::config::{ConfigError, SupabaseConfig};
use crate::models::{AuthUser, NewIdentity};

/// Which key the client presents to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    Anon,
    ServiceRole,
}

/// PostgREST and GoTrue admin client over reqwest
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
    role: KeyRole,
    users_per_page: u32,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Deserialize)]
struct UsersPage {
    #[serde(default)]
    users: Vec<AuthUser>,
}

impl SupabaseClient {
    /// Privileged client; bypasses row level security
    pub fn service_role(config: &SupabaseConfig) -> Result<Self, ConfigError> {
        let url = config.require_url()?;
        let key = config.require_service_role_key()?;
        Self::build(config, url, key, KeyRole::ServiceRole)
    }

    /// Client carrying only the public key
    pub fn anon(config: &SupabaseConfig) -> Result<Self, ConfigError> {
        let url = config.require_url()?;
        let key = config.require_anon_key()?;
        Self::build(config, url, key, KeyRole::Anon)
    }

    fn build(config: &SupabaseConfig, url: &str, key: &str, role: KeyRole) -> Result<Self, ConfigError> {
        let mut base_url = Url::parse(url).map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", url, e)))?;
        // Url::join drops the last segment unless the path ends with a slash
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            api_key: key.to_string(),
            role,
            users_per_page: config.users_per_page.max(1),
        })
    }

    pub fn role(&self) -> KeyRole {
        self.role
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.base_url
            .join(path)
            .map_err(|e| StoreError::Transport(format!("invalid endpoint {}: {}", path, e)))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    /// PostgREST picks the schema from Accept-Profile on reads and Content-Profile on writes
    fn rest(&self, method: Method, table: &TableRef) -> Result<RequestBuilder, StoreError> {
        let url = self.endpoint(&format!("rest/v1/{}", table.table))?;
        let profile_header = if method == Method::GET { "Accept-Profile" } else { "Content-Profile" };
        let builder = self.request(method.clone(), url).header(profile_header, &table.schema);
        Ok(if method == Method::GET {
            builder
        } else {
            builder.header("Prefer", "return=representation")
        })
    }

    async fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::from_body(status.as_u16(), &body));
        }
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

fn returning_clause(columns: &[&str]) -> String {
    if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(",")
    }
}

#[async_trait]
impl TableStore for SupabaseClient {
    async fn select(&self, table: &TableRef, query: &SelectQuery) -> Result<Vec<Value>, StoreError> {
        let params = query.to_params()?;
        debug!(table = %table, ?params, "select");
        let response = self.rest(Method::GET, table)?.query(&params).send().await?;
        Self::read_json(response).await
    }

    async fn insert(&self, table: &TableRef, row: &Value) -> Result<Value, StoreError> {
        debug!(table = %table, "insert");
        let response = self
            .rest(Method::POST, table)?
            .query(&[("select", "*")])
            .json(row)
            .send()
            .await?;
        let mut rows: Vec<Value> = Self::read_json(response).await?;
        if rows.is_empty() {
            return Err(StoreError::NoRows(table.to_string()));
        }
        Ok(rows.swap_remove(0))
    }

    async fn update(
        &self,
        table: &TableRef,
        patch: &Value,
        scope: &Scope,
        returning: &[&str],
    ) -> Result<Vec<Value>, StoreError> {
        let mut params = scope.to_params("update")?;
        params.push(("select".to_string(), returning_clause(returning)));
        debug!(table = %table, ?params, "update");
        let response = self
            .rest(Method::PATCH, table)?
            .query(&params)
            .json(patch)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn delete(&self, table: &TableRef, scope: &Scope, returning: &[&str]) -> Result<Vec<Value>, StoreError> {
        let mut params = scope.to_params("delete")?;
        params.push(("select".to_string(), returning_clause(returning)));
        debug!(table = %table, ?params, "delete");
        let response = self.rest(Method::DELETE, table)?.query(&params).send().await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl IdentityAdmin for SupabaseClient {
    async fn list_users(&self) -> Result<Vec<AuthUser>, StoreError> {
        let url = self.endpoint("auth/v1/admin/users")?;
        let per_page = self.users_per_page;
        let mut users = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .request(Method::GET, url.clone())
                .query(&[("page", page), ("per_page", per_page)])
                .send()
                .await?;
            let batch: UsersPage = Self::read_json(response).await?;
            let fetched = batch.users.len();
            users.extend(batch.users);

            if fetched < per_page as usize {
                break;
            }
            page += 1;
        }

        debug!(count = users.len(), pages = page, "listed identities");
        Ok(users)
    }

    async fn create_user(&self, user: &NewIdentity) -> Result<AuthUser, StoreError> {
        let url = self.endpoint("auth/v1/admin/users")?;
        let response = self.request(Method::POST, url).json(user).send().await?;
        let body: Value = Self::read_json(response).await?;

        // Some GoTrue versions wrap the record in { user }
        let record = match body.get("user") {
            Some(inner) if inner.is_object() => inner.clone(),
            _ => body,
        };
        Ok(serde_json::from_value(record)?)
    }
}
