use serde_json::{json, Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::models::profile::ProfileEmail;
use crate::seed::DependentTable;
use crate::supabase::{Condition, Scope, SelectQuery, StoreError, TableRef, TableStore};

use super::{decode_rows, ServiceError};

/// Rows removed from one dependent table, kept for compensation
#[derive(Debug)]
struct Snapshot {
    table: TableRef,
    rows: Vec<Value>,
}

#[derive(Debug)]
pub struct CascadeOutcome {
    pub deleted: Vec<ProfileEmail>,
    /// The parent delete only succeeded on its second attempt
    pub used_fallback: bool,
}

/// Deletes parent rows after clearing every configured dependent table.
///
/// Each dependent step snapshots what it removes. When a step fails, or the
/// parent delete fails twice, the snapshots are re-inserted newest first and
/// the whole operation reports failure.
pub struct CascadeDelete<'a> {
    store: &'a dyn TableStore,
    parent: TableRef,
    dependents: &'a [DependentTable],
}

impl<'a> CascadeDelete<'a> {
    pub fn new(store: &'a dyn TableStore, parent: TableRef, dependents: &'a [DependentTable]) -> Self {
        Self {
            store,
            parent,
            dependents,
        }
    }

    pub async fn run(&self, ids: &[Uuid]) -> Result<CascadeOutcome, ServiceError> {
        let id_values: Vec<Value> = ids.iter().map(|id| Value::String(id.to_string())).collect();
        let mut completed: Vec<Snapshot> = Vec::new();

        for dependent in self.dependents {
            let table = dependent.table_ref();
            let condition = Condition::is_in(dependent.column.clone(), id_values.clone());

            let query = SelectQuery::new().columns(&["*"]).filter(condition.clone());
            let rows = match self.store.select(&table, &query).await {
                Ok(rows) => rows,
                Err(e) => {
                    let message = format!("Failed to snapshot {}", table);
                    return Err(self.abort(completed, message, json!(e.message())).await);
                }
            };

            match self.store.delete(&table, &Scope::matching(condition), &[]).await {
                Ok(removed) => {
                    info!("Deleted {} rows from {}", removed.len(), table);
                    completed.push(Snapshot { table, rows });
                }
                Err(e) => {
                    error!("Error deleting from {}: {}", table, e);
                    let message = format!("Failed to delete from {}", table);
                    return Err(self.abort(completed, message, json!(e.message())).await);
                }
            }
        }

        let scope = Scope::matching(Condition::is_in("id", id_values));
        let returning = ["id", "email"];

        let (rows, used_fallback) = match self.store.delete(&self.parent, &scope, &returning).await {
            Ok(rows) => (rows, false),
            Err(first) => {
                warn!("Deleting from {} failed, trying once more: {}", self.parent, first);
                match self.store.delete(&self.parent, &scope, &returning).await {
                    Ok(rows) => (rows, true),
                    Err(second) => {
                        error!("Second delete from {} also failed: {}", self.parent, second);
                        let details = json!({
                            "first_attempt_error": first.message(),
                            "second_attempt_error": second.message(),
                            "attempted": ids.len(),
                        });
                        let message = format!("Failed to delete from {}", self.parent);
                        return Err(self.abort(completed, message, details).await);
                    }
                }
            }
        };

        info!("Deleted {} rows from {}", rows.len(), self.parent);
        let deleted = decode_rows(rows, "Failed to decode deleted rows")?;
        Ok(CascadeOutcome { deleted, used_fallback })
    }

    /// Restore completed steps in reverse order and build the failure
    async fn abort(&self, completed: Vec<Snapshot>, message: String, details: Value) -> ServiceError {
        let mut compensation_errors = Vec::new();

        for snapshot in completed.into_iter().rev() {
            info!("Restoring {} rows into {}", snapshot.rows.len(), snapshot.table);
            for row in &snapshot.rows {
                if let Err(e) = self.store.insert(&snapshot.table, row).await {
                    error!("Failed to restore row into {}: {}", snapshot.table, e);
                    compensation_errors.push(restore_failure(&snapshot.table, row, &e));
                }
            }
        }

        let mut extra = Map::new();
        if !compensation_errors.is_empty() {
            extra.insert("compensation_errors".to_string(), Value::Array(compensation_errors));
        }
        ServiceError::Failed { message, details, extra }
    }
}

fn restore_failure(table: &TableRef, row: &Value, err: &StoreError) -> Value {
    json!({
        "table": table.to_string(),
        "id": row.get("id").cloned().unwrap_or(Value::Null),
        "error": err.message(),
    })
}
