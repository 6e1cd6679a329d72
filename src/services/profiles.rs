use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::models::profile::{ProfileEmail, ProfileSummary, PROFILE_COLUMNS, PROFILE_SUMMARY_COLUMNS};
use crate::models::{AuthUser, BatchReport, ListResponse, NewProfile, ProfileRow, ProfileView, Role, SeedFailure};
use crate::seed::{split_name, SeedConfig};
use crate::supabase::{OrderBy, Scope, SelectQuery};

use super::{decode_rows, Backend, CascadeDelete, ServiceError, Tenant, UpstreamContext};

/// Result entry for one seeded profile
#[derive(Debug, Clone, Serialize)]
pub struct SeededProfile {
    pub email: String,
    pub name: String,
    pub ehs_id: String,
    pub role: Role,
    pub auth_id: Uuid,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordReset {
    pub success: bool,
    pub updated: usize,
    pub message: String,
    pub profiles: Vec<ProfileSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainCleanup {
    pub success: bool,
    pub deleted: usize,
    pub message: String,
    pub deleted_profiles: Vec<ProfileEmail>,
}

pub type ProfileSeedReport = BatchReport<SeededProfile, SeedFailure>;

/// Profile operations scoped to one tenant schema
pub struct ProfileService<'a> {
    backend: &'a Backend,
    seed: &'a SeedConfig,
    tenant: Tenant,
}

impl<'a> ProfileService<'a> {
    pub fn new(backend: &'a Backend, seed: &'a SeedConfig, tenant: &str) -> Result<Self, ServiceError> {
        let tenant = Tenant::resolve(seed, tenant)?;
        Ok(Self { backend, seed, tenant })
    }

    pub fn tenant(&self) -> &Tenant {
        &self.tenant
    }

    pub async fn list(&self) -> Result<ListResponse<ProfileView>, ServiceError> {
        let query = SelectQuery::new()
            .columns(PROFILE_COLUMNS)
            .order(OrderBy::desc("created_at"));

        let rows = self
            .backend
            .store
            .select(&self.tenant.profiles(), &query)
            .await
            .context("Failed to fetch profiles")?;
        let rows: Vec<ProfileRow> = decode_rows(rows, "Failed to fetch profiles")?;

        Ok(ListResponse::new(rows.into_iter().map(ProfileView::from).collect()))
    }

    /// Insert one profile per demo record. Per-record failures are collected,
    /// never rolled back.
    pub async fn seed(&self) -> Result<ProfileSeedReport, ServiceError> {
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

        let mut ids = self.seed.allocator();
        let mut results = Vec::new();
        let mut errors = Vec::new();
        let table = self.tenant.profiles();

        for record in &self.seed.records {
            let Some(auth) = by_email.get(record.email.as_str()) else {
                errors.push(SeedFailure {
                    email: record.email.clone(),
                    error: format!("Auth user not found for email: {}", record.email),
                });
                continue;
            };

            let ehs_id = ids.allocate(&record.domain);
            let (first_name, last_name) = split_name(&record.name);
            let row = NewProfile {
                id: auth.id,
                email: record.email.clone(),
                ehs_id: ehs_id.clone(),
                first_name,
                last_name,
                role: record.role.clone(),
                password: self.tenant.settings.password_hash.clone(),
                capacity: self.seed.default_capacity,
                created_by: self.seed.default_actor_id.clone(),
                updated_by: self.seed.default_actor_id.clone(),
            };

            match self.backend.store.insert(&table, &json!(row)).await {
                Ok(_) => {
                    info!("Created profile {} for {}", ehs_id, record.email);
                    results.push(SeededProfile {
                        email: record.email.clone(),
                        name: record.name.clone(),
                        ehs_id,
                        role: record.role.clone(),
                        auth_id: auth.id,
                        success: true,
                    });
                }
                Err(e) => {
                    error!("Error creating profile for {}: {}", record.email, e);
                    errors.push(SeedFailure {
                        email: record.email.clone(),
                        error: format!("Profile creation failed: {}", e.message()),
                    });
                }
            }
        }

        Ok(BatchReport::new("profiles", self.seed.records.len(), results, errors))
    }

    /// Set every profile's password to the tenant's configured hash
    pub async fn reset_passwords(&self) -> Result<PasswordReset, ServiceError> {
        let hash = self.tenant.settings.password_hash.as_deref().ok_or_else(|| {
            ServiceError::validation(format!(
                "No password hash configured for tenant {}",
                self.tenant.key()
            ))
        })?;

        let patch = json!({
            "password": hash,
            "updated_at": Utc::now().to_rfc3339(),
        });
        let rows = self
            .backend
            .store
            .update(&self.tenant.profiles(), &patch, &Scope::All, PROFILE_SUMMARY_COLUMNS)
            .await
            .context("Failed to update profiles")?;
        let profiles: Vec<ProfileSummary> = decode_rows(rows, "Failed to update profiles")?;

        info!("Updated password for {} profiles in {}", profiles.len(), self.tenant.schema());
        Ok(PasswordReset {
            success: true,
            updated: profiles.len(),
            message: format!("Successfully updated {} profiles with new password hash", profiles.len()),
            profiles,
        })
    }

    /// Remove profiles whose email is outside every configured domain,
    /// together with the rows that reference them
    pub async fn delete_outside_domains(&self) -> Result<DomainCleanup, ServiceError> {
        let table = self.tenant.profiles();
        let query = SelectQuery::new().columns(&["id", "email"]);
        let rows = self
            .backend
            .store
            .select(&table, &query)
            .await
            .context("Failed to fetch profiles")?;
        let rows: Vec<ProfileEmail> = decode_rows(rows, "Failed to fetch profiles")?;

        let ids: Vec<Uuid> = rows
            .iter()
            .filter(|p| !p.email.as_deref().map(|e| self.seed.is_allowed_email(e)).unwrap_or(false))
            .map(|p| p.id)
            .collect();
        info!("Found {} profiles to delete in {}", ids.len(), self.tenant.schema());

        if ids.is_empty() {
            return Ok(DomainCleanup {
                success: true,
                deleted: 0,
                message: "No profiles found to delete - they may have already been deleted".to_string(),
                deleted_profiles: vec![],
            });
        }

        let outcome = CascadeDelete::new(self.backend.store.as_ref(), table, &self.tenant.settings.cascade)
            .run(&ids)
            .await?;

        let deleted = outcome.deleted.len();
        let suffix = if outcome.used_fallback { " (fallback method)" } else { "" };
        Ok(DomainCleanup {
            success: true,
            deleted,
            message: format!("Successfully deleted {} profiles with non-matching domains{}", deleted, suffix),
            deleted_profiles: outcome.deleted,
        })
    }
}
