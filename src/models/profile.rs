use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fallback shown when a profile has neither name part
pub const NO_NAME: &str = "N/A";

/// Columns read by the profile listing
pub const PROFILE_COLUMNS: &[&str] = &[
    "id",
    "email",
    "ehs_id",
    "first_name",
    "last_name",
    "role",
    "updated_at",
    "created_at",
    "created_by",
    "updated_by",
    "password",
    "capacity",
];

/// Columns returned after a bulk password reset
pub const PROFILE_SUMMARY_COLUMNS: &[&str] = &["id", "email", "ehs_id", "first_name", "last_name", "role"];

/// Join the name parts for display. Empty strings count as missing.
pub fn display_name(first: Option<&str>, last: Option<&str>) -> String {
    let first = first.filter(|s| !s.is_empty());
    let last = last.filter(|s| !s.is_empty());
    match (first, last) {
        (Some(f), Some(l)) => format!("{} {}", f, l),
        (Some(one), None) | (None, Some(one)) => one.to_string(),
        (None, None) => NO_NAME.to_string(),
    }
}

/// Role tag stored on a profile. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Manager,
    AssistantManager,
    TeamLead,
    Qa,
    User,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Manager => "manager",
            Role::AssistantManager => "assistant_manager",
            Role::TeamLead => "teamLead",
            Role::Qa => "qa",
            Role::User => "user",
            Role::Other(s) => s,
        }
    }

    /// Badge styling used by the dashboard tables
    pub fn badge_classes(&self) -> &'static str {
        match self {
            Role::Manager => "bg-red-100 text-red-800",
            Role::AssistantManager => "bg-orange-100 text-orange-800",
            Role::TeamLead => "bg-blue-100 text-blue-800",
            Role::Qa => "bg-green-100 text-green-800",
            Role::User | Role::Other(_) => "bg-gray-100 text-gray-800",
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "manager" => Role::Manager,
            "assistant_manager" => Role::AssistantManager,
            "teamLead" => Role::TeamLead,
            "qa" => Role::Qa,
            "user" => Role::User,
            _ => Role::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn badge_for(role: Option<&Role>) -> &'static str {
    role.map(Role::badge_classes).unwrap_or(Role::User.badge_classes())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: Uuid,
    pub email: Option<String>,
    pub ehs_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub password: Option<String>,
    pub capacity: Option<i64>,
}

/// Profile as rendered by the listing endpoints
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    pub email: Option<String>,
    pub ehs_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub role: Option<Role>,
    pub role_badge: &'static str,
    pub updated_at: Option<String>,
    pub created_at: Option<String>,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub password: Option<String>,
    pub capacity: Option<i64>,
}

impl From<ProfileRow> for ProfileView {
    fn from(row: ProfileRow) -> Self {
        let full_name = display_name(row.first_name.as_deref(), row.last_name.as_deref());
        let role_badge = badge_for(row.role.as_ref());
        Self {
            id: row.id,
            email: row.email,
            ehs_id: row.ehs_id,
            first_name: row.first_name,
            last_name: row.last_name,
            full_name,
            role: row.role,
            role_badge,
            updated_at: row.updated_at,
            created_at: row.created_at,
            created_by: row.created_by,
            updated_by: row.updated_by,
            password: row.password,
            capacity: row.capacity,
        }
    }
}

/// Row shape returned by the password reset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: Uuid,
    pub email: Option<String>,
    pub ehs_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
}

/// Minimal projection used when selecting delete candidates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEmail {
    pub id: Uuid,
    pub email: Option<String>,
}

/// New row written by the seed routine
#[derive(Debug, Clone, Serialize)]
pub struct NewProfile {
    pub id: Uuid,
    pub email: String,
    pub ehs_id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub password: Option<String>,
    pub capacity: i64,
    pub created_by: String,
    pub updated_by: String,
}
