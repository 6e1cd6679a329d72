use async_trait::async_trait;
use serde_json::Value;

use super::error::StoreError;
use super::query::{Scope, SelectQuery, TableRef};
use crate::models::{AuthUser, NewIdentity};

/// Schema-qualified table access with the privileges of the caller's key
#[async_trait]
pub trait TableStore: Send + Sync {
    async fn select(&self, table: &TableRef, query: &SelectQuery) -> Result<Vec<Value>, StoreError>;

    /// Insert one row and return it as stored
    async fn insert(&self, table: &TableRef, row: &Value) -> Result<Value, StoreError>;

    /// Apply `patch` to every row in `scope`; returns the updated rows projected to `returning`
    async fn update(
        &self,
        table: &TableRef,
        patch: &Value,
        scope: &Scope,
        returning: &[&str],
    ) -> Result<Vec<Value>, StoreError>;

    /// Remove every row in `scope`; returns the deleted rows projected to `returning`
    async fn delete(&self, table: &TableRef, scope: &Scope, returning: &[&str]) -> Result<Vec<Value>, StoreError>;
}

/// Identity-provider administration
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Every identity, across all pages
    async fn list_users(&self) -> Result<Vec<AuthUser>, StoreError>;

    async fn create_user(&self, user: &NewIdentity) -> Result<AuthUser, StoreError>;
}
