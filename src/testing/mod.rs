//! In-memory stand-ins for the table store and the identity admin API.
//!
//! The store emulates the parts of PostgREST the services rely on: filters,
//! ordering, foreign-key embeds, generated `id` / `created_at`, primary-key
//! uniqueness and restrictive foreign keys. Failures can be injected per table
//! and operation.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::models::{AuthUser, NewIdentity};
use crate::seed::SeedConfig;
use crate::services::Backend;
use crate::supabase::{
    Column, Condition, FilterOp, IdentityAdmin, Scope, SelectQuery, SortDirection, StoreError, TableRef, TableStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    table: TableRef,
    op: Op,
    remaining: usize,
    message: String,
}

#[derive(Debug, Clone)]
struct ForeignKey {
    child: TableRef,
    column: String,
    parent: TableRef,
}

/// Timestamps handed out in strictly increasing order
fn tick(clock: &AtomicI64) -> String {
    let n = clock.fetch_add(1, Ordering::SeqCst);
    let base: DateTime<Utc> = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
        .expect("valid base timestamp")
        .with_timezone(&Utc);
    (base + Duration::seconds(n)).to_rfc3339()
}

pub fn table(schema: &str, name: &str) -> TableRef {
    TableRef::new(schema, name).expect("valid test table")
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<TableRef, Vec<Value>>>,
    relations: Mutex<HashMap<(TableRef, String), String>>,
    foreign_keys: Mutex<Vec<ForeignKey>>,
    unique: Mutex<HashMap<TableRef, Vec<Vec<String>>>>,
    failures: Mutex<Vec<InjectedFailure>>,
    calls: Mutex<Vec<(Op, TableRef)>>,
    clock: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embed `relation` into rows of `table` through `fk_column`
    pub fn relation(&self, table: &TableRef, relation: &str, fk_column: &str) -> &Self {
        self.relations
            .lock()
            .unwrap()
            .insert((table.clone(), relation.to_string()), fk_column.to_string());
        self
    }

    /// Parent rows cannot be deleted while `child.column` references them
    pub fn foreign_key(&self, child: &TableRef, column: &str, parent: &TableRef) -> &Self {
        self.foreign_keys.lock().unwrap().push(ForeignKey {
            child: child.clone(),
            column: column.to_string(),
            parent: parent.clone(),
        });
        self
    }

    pub fn unique(&self, table: &TableRef, columns: &[&str]) -> &Self {
        self.unique
            .lock()
            .unwrap()
            .entry(table.clone())
            .or_default()
            .push(columns.iter().map(|c| c.to_string()).collect());
        self
    }

    /// Fail the next `times` calls of `op` on `table`
    pub fn fail(&self, table: &TableRef, op: Op, times: usize, message: &str) -> &Self {
        self.failures.lock().unwrap().push(InjectedFailure {
            table: table.clone(),
            op,
            remaining: times,
            message: message.to_string(),
        });
        self
    }

    /// Insert rows directly, without failure injection
    pub fn put(&self, table: &TableRef, rows: Vec<Value>) {
        for row in rows {
            self.insert_row(table, &row).expect("fixture row inserts");
        }
    }

    pub fn rows(&self, table: &TableRef) -> Vec<Value> {
        self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
    }

    pub fn call_count(&self, op: Op, table: &TableRef) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(o, t)| *o == op && t == table)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(&self, op: Op, table: &TableRef) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push((op, table.clone()));
        let mut failures = self.failures.lock().unwrap();
        if let Some(f) = failures
            .iter_mut()
            .find(|f| f.op == op && &f.table == table && f.remaining > 0)
        {
            f.remaining -= 1;
            return Err(StoreError::api(500, f.message.clone()));
        }
        Ok(())
    }

    fn insert_row(&self, table: &TableRef, row: &Value) -> Result<Value, StoreError> {
        let mut row = row
            .as_object()
            .cloned()
            .ok_or_else(|| StoreError::api(400, "insert body must be an object"))?;
        row.entry("id").or_insert_with(|| json!(Uuid::new_v4().to_string()));
        row.entry("created_at").or_insert_with(|| json!(tick(&self.clock)));
        let row = Value::Object(row);

        let mut tables = self.tables.lock().unwrap();
        let existing = tables.entry(table.clone()).or_default();

        if existing.iter().any(|r| r.get("id") == row.get("id")) {
            return Err(StoreError::api(
                409,
                format!("duplicate key value violates unique constraint \"{}_pkey\"", table.table),
            )
            .with_code("23505"));
        }
        if let Some(keys) = self.unique.lock().unwrap().get(table) {
            for key in keys {
                let clash = existing
                    .iter()
                    .any(|r| key.iter().all(|c| r.get(c) == row.get(c)));
                if clash {
                    return Err(StoreError::api(
                        409,
                        format!(
                            "duplicate key value violates unique constraint \"{}_{}_key\"",
                            table.table,
                            key.join("_")
                        ),
                    )
                    .with_code("23505"));
                }
            }
        }

        existing.push(row.clone());
        Ok(row)
    }

    fn matching_indices(rows: &[Value], conditions: &[Condition]) -> Vec<usize> {
        rows.iter()
            .enumerate()
            .filter(|(_, row)| conditions.iter().all(|c| condition_matches(row, c)))
            .map(|(i, _)| i)
            .collect()
    }

    fn scope_conditions(scope: &Scope, action: &'static str) -> Result<Vec<Condition>, StoreError> {
        scope.to_params(action)?;
        Ok(match scope {
            Scope::All => vec![],
            Scope::Matching(conditions) => conditions.clone(),
        })
    }

    fn project(&self, table: &TableRef, row: &Value, columns: &[Column], all: &HashMap<TableRef, Vec<Value>>) -> Value {
        let wildcard = columns.is_empty() || columns.iter().any(|c| matches!(c, Column::Plain(n) if n == "*"));
        let mut out = if wildcard {
            row.as_object().cloned().unwrap_or_default()
        } else {
            Map::new()
        };

        for column in columns {
            match column {
                Column::Plain(name) if name == "*" => {}
                Column::Plain(name) => {
                    out.insert(name.clone(), row.get(name).cloned().unwrap_or(Value::Null));
                }
                Column::Embed { relation, columns, .. } => {
                    let fk = self
                        .relations
                        .lock()
                        .unwrap()
                        .get(&(table.clone(), relation.clone()))
                        .cloned();
                    let target = TableRef {
                        schema: table.schema.clone(),
                        table: relation.clone(),
                    };
                    let embedded = fk
                        .and_then(|fk| row.get(&fk).cloned())
                        .and_then(|id| {
                            all.get(&target)
                                .and_then(|rows| rows.iter().find(|r| r.get("id").map(|v| loose_eq(v, &id)).unwrap_or(false)))
                                .cloned()
                        })
                        .map(|r| self.project(&target, &r, columns, all))
                        .unwrap_or(Value::Null);
                    out.insert(relation.clone(), embedded);
                }
            }
        }
        Value::Object(out)
    }

    fn project_names(row: &Value, returning: &[&str]) -> Value {
        if returning.is_empty() {
            return row.clone();
        }
        let mut out = Map::new();
        for name in returning {
            out.insert(name.to_string(), row.get(*name).cloned().unwrap_or(Value::Null));
        }
        Value::Object(out)
    }
}

#[async_trait]
impl TableStore for MemoryStore {
    async fn select(&self, table: &TableRef, query: &SelectQuery) -> Result<Vec<Value>, StoreError> {
        query.to_params()?;
        self.record(Op::Select, table)?;
        let all = self.tables.lock().unwrap().clone();
        let rows = all.get(table).cloned().unwrap_or_default();

        let mut matched: Vec<Value> = Self::matching_indices(&rows, &query.conditions)
            .into_iter()
            .map(|i| rows[i].clone())
            .collect();

        for order in query.order.iter().rev() {
            matched.sort_by(|a, b| {
                let ord = compare(a.get(&order.column), b.get(&order.column));
                match order.sort {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }

        Ok(matched
            .iter()
            .map(|row| self.project(table, row, &query.columns, &all))
            .collect())
    }

    async fn insert(&self, table: &TableRef, row: &Value) -> Result<Value, StoreError> {
        self.record(Op::Insert, table)?;
        self.insert_row(table, row)
    }

    async fn update(
        &self,
        table: &TableRef,
        patch: &Value,
        scope: &Scope,
        returning: &[&str],
    ) -> Result<Vec<Value>, StoreError> {
        let conditions = Self::scope_conditions(scope, "update")?;
        self.record(Op::Update, table)?;
        let patch = patch.as_object().cloned().unwrap_or_default();

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table.clone()).or_default();
        let mut updated = Vec::new();
        for i in Self::matching_indices(rows, &conditions) {
            if let Some(obj) = rows[i].as_object_mut() {
                for (k, v) in &patch {
                    obj.insert(k.clone(), v.clone());
                }
            }
            updated.push(Self::project_names(&rows[i], returning));
        }
        Ok(updated)
    }

    async fn delete(&self, table: &TableRef, scope: &Scope, returning: &[&str]) -> Result<Vec<Value>, StoreError> {
        let conditions = Self::scope_conditions(scope, "delete")?;
        self.record(Op::Delete, table)?;

        let mut tables = self.tables.lock().unwrap();
        let rows = tables.get(table).cloned().unwrap_or_default();
        let doomed = Self::matching_indices(&rows, &conditions);
        let doomed_ids: Vec<Value> = doomed.iter().filter_map(|i| rows[*i].get("id").cloned()).collect();

        for fk in self.foreign_keys.lock().unwrap().iter().filter(|fk| &fk.parent == table) {
            let referenced = tables
                .get(&fk.child)
                .map(|children| {
                    children.iter().any(|c| {
                        c.get(&fk.column)
                            .map(|v| doomed_ids.iter().any(|id| loose_eq(v, id)))
                            .unwrap_or(false)
                    })
                })
                .unwrap_or(false);
            if referenced {
                return Err(StoreError::api(
                    409,
                    format!(
                        "update or delete on table \"{}\" violates foreign key constraint \"{}_{}_fkey\" on table \"{}\"",
                        table.table, fk.child.table, fk.column, fk.child.table
                    ),
                )
                .with_code("23503"));
            }
        }

        let doomed_set: HashSet<usize> = doomed.iter().copied().collect();
        let mut kept = Vec::new();
        let mut deleted = Vec::new();
        for (i, row) in rows.into_iter().enumerate() {
            if doomed_set.contains(&i) {
                deleted.push(Self::project_names(&row, returning));
            } else {
                kept.push(row);
            }
        }
        tables.insert(table.clone(), kept);
        Ok(deleted)
    }
}

fn text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    a == b || matches!((text(a), text(b)), (Some(x), Some(y)) if x == y)
}

fn like(value: &str, pattern: &str) -> bool {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    Regex::new(&format!("^{}$", escaped))
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

fn condition_matches(row: &Value, condition: &Condition) -> bool {
    let field = row.get(&condition.column).unwrap_or(&Value::Null);
    match condition.op {
        FilterOp::Eq => !field.is_null() && loose_eq(field, &condition.value),
        FilterOp::Neq => !field.is_null() && !loose_eq(field, &condition.value),
        FilterOp::In => condition
            .value
            .as_array()
            .map(|values| values.iter().any(|v| loose_eq(field, v)))
            .unwrap_or(false),
        FilterOp::Like => field
            .as_str()
            .zip(condition.value.as_str())
            .map(|(s, p)| like(s, p))
            .unwrap_or(false),
        FilterOp::NotLike => field
            .as_str()
            .zip(condition.value.as_str())
            .map(|(s, p)| !like(s, p))
            .unwrap_or(false),
        FilterOp::IsNull => field.is_null(),
        FilterOp::NotNull => !field.is_null(),
    }
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering::*;
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Equal),
        (Some(x), Some(y)) => text(x).cmp(&text(y)),
        (None, Some(_)) => Less,
        (Some(_), None) => Greater,
        (None, None) => Equal,
    }
}

/// Identity admin over a vector of users
#[derive(Default)]
pub struct MemoryIdentity {
    users: Mutex<Vec<AuthUser>>,
    rejected: Mutex<HashSet<String>>,
    list_failure: Mutex<Option<String>>,
    calls: AtomicUsize,
    clock: AtomicI64,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emails<'a>(emails: impl IntoIterator<Item = &'a str>) -> Self {
        let identity = Self::new();
        for email in emails {
            identity.add(email);
        }
        identity
    }

    pub fn add(&self, email: &str) -> AuthUser {
        let created = DateTime::parse_from_rfc3339(&tick(&self.clock))
            .expect("tick produces rfc3339")
            .with_timezone(&Utc);
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            created_at: Some(created),
            updated_at: Some(created),
            last_sign_in_at: None,
            email_confirmed_at: Some(created),
            phone: None,
            phone_confirmed_at: None,
            is_anonymous: false,
            app_metadata: json!({"provider": "email"}),
            user_metadata: json!({}),
            identities: Some(vec![]),
        };
        self.users.lock().unwrap().push(user.clone());
        user
    }

    pub fn id_of(&self, email: &str) -> Option<Uuid> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .map(|u| u.id)
    }

    /// Make create_user fail for this email
    pub fn reject(&self, email: &str) {
        self.rejected.lock().unwrap().insert(email.to_string());
    }

    pub fn fail_listing(&self, message: &str) {
        *self.list_failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn users(&self) -> Vec<AuthUser> {
        self.users.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityAdmin for MemoryIdentity {
    async fn list_users(&self) -> Result<Vec<AuthUser>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = self.list_failure.lock().unwrap().clone() {
            return Err(StoreError::api(500, message));
        }
        Ok(self.users())
    }

    async fn create_user(&self, user: &NewIdentity) -> Result<AuthUser, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.rejected.lock().unwrap().contains(&user.email) || self.id_of(&user.email).is_some() {
            return Err(StoreError::api(
                422,
                "A user with this email address has already been registered",
            ));
        }
        let mut created = self.add(&user.email);
        if !user.email_confirm {
            created.email_confirmed_at = None;
            if let Some(stored) = self
                .users
                .lock()
                .unwrap()
                .iter_mut()
                .find(|u| u.id == created.id)
            {
                stored.email_confirmed_at = None;
            }
        }
        Ok(created)
    }
}

/// Store, identities and seed config wired like the hosted tenant schemas
pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub identity: Arc<MemoryIdentity>,
    pub seed: Arc<SeedConfig>,
}

impl Fixture {
    /// Identities exist for every demo record; `ehs_pa` and `ehs_ar` have
    /// projects 1 and 2.
    pub fn new() -> Self {
        let seed = SeedConfig::builtin().expect("builtin seed");
        let identity = MemoryIdentity::with_emails(seed.records.iter().map(|r| r.email.as_str()));
        let store = MemoryStore::new();

        for schema in ["ehs_pa", "ehs_ar", "ehs_ebv"] {
            let profiles = table(schema, "profiles");
            let mappings = table(schema, "profiles_projects_mapping");
            let projects = table(schema, "projects");
            store
                .relation(&mappings, "profiles", "profile_id")
                .relation(&mappings, "projects", "project_id")
                .foreign_key(&mappings, "profile_id", &profiles)
                .foreign_key(&table(schema, "refresh_tokens"), "user_id", &profiles);
            if schema != "ehs_ebv" {
                store.put(
                    &projects,
                    vec![
                        json!({"id": 101, "name": "Acme RCM", "client_id": "ACME", "client_sub_id": null, "project_id": 1}),
                        json!({"id": 102, "name": "Dollar RCM", "client_id": "DOLLAR", "client_sub_id": "DC-1", "project_id": 2}),
                    ],
                );
            }
        }
        // ehs_ar tokens also point at ehs_pa profiles
        store.foreign_key(&table("ehs_ar", "refresh_tokens"), "user_id", &table("ehs_pa", "profiles"));

        Self {
            store: Arc::new(store),
            identity: Arc::new(identity),
            seed: Arc::new(seed),
        }
    }

    pub fn backend(&self) -> Backend {
        Backend::new(self.store.clone(), self.identity.clone())
    }
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}
