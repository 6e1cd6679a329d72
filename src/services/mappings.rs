use std::collections::HashMap;

use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{error, info};

use crate::models::mapping::{MAPPING_COLUMNS, PROFILE_EMBED, PROFILE_EMBED_COLUMNS, PROJECT_EMBED};
use crate::models::project::PROJECT_COLUMNS;
use crate::models::{AuthUser, BatchReport, ListResponse, MappingRow, MappingView, NewMapping, SeedFailure};
use crate::seed::{DemoRecord, SeedConfig};
use crate::supabase::{Condition, OrderBy, Scope, SelectQuery};

use super::{decode_rows, Backend, ServiceError, Tenant, UpstreamContext};

#[derive(Debug, Clone, Serialize)]
pub struct SeededMapping {
    pub email: String,
    pub name: String,
    /// Tenant-local project number, not the projects row id
    pub project_id: i64,
    pub domain: String,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappingCleanup {
    pub success: bool,
    pub deleted: usize,
    pub message: String,
}

pub type MappingSeedReport = BatchReport<SeededMapping, SeedFailure>;

pub struct MappingService<'a> {
    backend: &'a Backend,
    seed: &'a SeedConfig,
    tenant: Tenant,
}

impl<'a> MappingService<'a> {
    pub fn new(backend: &'a Backend, seed: &'a SeedConfig, tenant: &str) -> Result<Self, ServiceError> {
        let tenant = Tenant::resolve(seed, tenant)?;
        Ok(Self { backend, seed, tenant })
    }

    pub async fn list(&self) -> Result<ListResponse<MappingView>, ServiceError> {
        let query = SelectQuery::new()
            .columns(MAPPING_COLUMNS)
            .embed(PROFILE_EMBED.0, Some(PROFILE_EMBED.1), PROFILE_EMBED_COLUMNS)
            .embed(PROJECT_EMBED.0, Some(PROJECT_EMBED.1), PROJECT_COLUMNS)
            .order(OrderBy::desc("created_at"));

        let rows = self
            .backend
            .store
            .select(&self.tenant.mappings(), &query)
            .await
            .context("Failed to fetch mappings")?;
        let rows: Vec<MappingRow> = decode_rows(rows, "Failed to fetch mappings")?;

        Ok(ListResponse::new(rows.into_iter().map(MappingView::from).collect()))
    }

    /// Map each demo record's identity to its domain's project
    pub async fn seed(&self) -> Result<MappingSeedReport, ServiceError> {
        let users = self
            .backend
            .identity
            .list_users()
            .await
            .context("Failed to fetch auth users")?;
        let by_email: HashMap<&str, &AuthUser> = users
            .iter()
            .filter_map(|u| u.email.as_deref().map(|e| (e, u)))
            .collect();

        let mut results = Vec::new();
        let mut errors = Vec::new();

        for record in &self.seed.records {
            match self.seed_one(record, &by_email).await {
                Ok(project_id) => results.push(SeededMapping {
                    email: record.email.clone(),
                    name: record.name.clone(),
                    project_id,
                    domain: record.domain.clone(),
                    success: true,
                }),
                Err(message) => errors.push(SeedFailure {
                    email: record.email.clone(),
                    error: message,
                }),
            }
        }

        Ok(BatchReport::new("mappings", self.seed.records.len(), results, errors))
    }

    async fn seed_one(&self, record: &DemoRecord, users: &HashMap<&str, &AuthUser>) -> Result<i64, String> {
        let auth = users
            .get(record.email.as_str())
            .ok_or_else(|| format!("Auth user not found for email: {}", record.email))?;

        let project_number = self
            .seed
            .domain_rule(&record.domain)
            .and_then(|rule| rule.project_id)
            .ok_or_else(|| format!("No project configured for domain {}", record.domain))?;

        let query = SelectQuery::new()
            .columns(&["id"])
            .filter(Condition::eq("project_id", project_number));
        let not_found = || format!("Project with ID {} not found", project_number);
        let project_row_id = match self.backend.store.select(&self.tenant.projects(), &query).await {
            Ok(rows) if rows.len() == 1 => rows[0].get("id").cloned().unwrap_or(Value::Null),
            Ok(_) => return Err(not_found()),
            Err(e) => {
                error!("Error looking up project {}: {}", project_number, e);
                return Err(not_found());
            }
        };

        let row = NewMapping {
            profile_id: auth.id,
            project_id: project_row_id,
            created_by: self.seed.default_actor_id.clone(),
            updated_by: self.seed.default_actor_id.clone(),
        };
        match self.backend.store.insert(&self.tenant.mappings(), &json!(row)).await {
            Ok(_) => {
                info!("Mapped {} to project {}", record.email, project_number);
                Ok(project_number)
            }
            Err(e) => {
                error!("Error creating mapping for {}: {}", record.email, e);
                Err(format!("Mapping creation failed: {}", e.message()))
            }
        }
    }

    /// Delete mappings one id at a time, collecting every failure
    pub async fn delete_all(&self) -> Result<MappingCleanup, ServiceError> {
        let table = self.tenant.mappings();
        let rows = self
            .backend
            .store
            .select(&table, &SelectQuery::new().columns(&["id"]))
            .await
            .context("Failed to fetch existing mappings")?;
        info!("Found {} mappings in {}", rows.len(), self.tenant.schema());

        let mut deleted = 0;
        let mut failures = Vec::new();
        for row in rows {
            let id = row.get("id").cloned().unwrap_or(Value::Null);
            let scope = Scope::matching(Condition::eq("id", id.clone()));
            match self.backend.store.delete(&table, &scope, &["id"]).await {
                Ok(removed) if !removed.is_empty() => deleted += 1,
                Ok(_) => {}
                Err(e) => {
                    error!("Error deleting mapping {}: {}", id, e);
                    failures.push(json!({ "id": id, "error": e.message() }));
                }
            }
        }

        if !failures.is_empty() {
            let mut extra = Map::new();
            extra.insert("deleted".to_string(), json!(deleted));
            extra.insert("failed".to_string(), json!(failures.len()));
            return Err(ServiceError::Failed {
                message: "Some deletions failed".to_string(),
                details: Value::Array(failures),
                extra,
            });
        }

        Ok(MappingCleanup {
            success: true,
            deleted,
            message: format!("Successfully deleted {} mappings", deleted),
        })
    }
}
