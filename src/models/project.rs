use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PROJECT_COLUMNS: &[&str] = &[
    "id",
    "name",
    "client_id",
    "client_sub_id",
    "project_id",
    "created_at",
    "updated_at",
    "created_by",
    "updated_by",
];

/// Project row. Owned by the external store; only read here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: Value,
    pub name: Option<String>,
    pub client_id: Option<String>,
    pub client_sub_id: Option<String>,
    pub project_id: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}
