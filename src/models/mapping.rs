use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::profile::{display_name, Role};
use super::project::ProjectRow;

pub const MAPPING_COLUMNS: &[&str] = &[
    "id",
    "profile_id",
    "project_id",
    "created_at",
    "updated_at",
    "created_by",
    "updated_by",
];

pub const PROFILE_EMBED: (&str, &str) = ("profiles", "profiles_projects_mapping_profile_id_fkey");
pub const PROFILE_EMBED_COLUMNS: &[&str] = &["id", "email", "first_name", "last_name", "ehs_id", "role"];

pub const PROJECT_EMBED: (&str, &str) = ("projects", "profiles_projects_mapping_project_id_fkey");

/// Mapping row with its profile and project expanded through the foreign keys
#[derive(Debug, Clone, Deserialize)]
pub struct MappingRow {
    pub id: Value,
    pub profile_id: Option<Uuid>,
    pub project_id: Option<Value>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub profiles: Option<EmbeddedProfile>,
    pub projects: Option<ProjectRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub ehs_id: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappingProfileView {
    pub id: Uuid,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub ehs_id: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MappingView {
    pub id: Value,
    pub profile_id: Option<Uuid>,
    pub project_id: Option<Value>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub profile: Option<MappingProfileView>,
    pub project: Option<ProjectRow>,
}

impl From<EmbeddedProfile> for MappingProfileView {
    fn from(p: EmbeddedProfile) -> Self {
        let full_name = display_name(p.first_name.as_deref(), p.last_name.as_deref());
        Self {
            id: p.id,
            email: p.email,
            first_name: p.first_name,
            last_name: p.last_name,
            full_name,
            ehs_id: p.ehs_id,
            role: p.role,
        }
    }
}

impl From<MappingRow> for MappingView {
    fn from(row: MappingRow) -> Self {
        Self {
            id: row.id,
            profile_id: row.profile_id,
            project_id: row.project_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
            profile: row.profiles.map(Into::into),
            project: row.projects,
        }
    }
}

/// New row written by the mapping seed
#[derive(Debug, Clone, Serialize)]
pub struct NewMapping {
    pub profile_id: Uuid,
    pub project_id: Value,
    pub created_by: String,
    pub updated_by: String,
}
