use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::models::{AuthUser, BatchReport, CreatedUser, ListResponse, NewIdentity};

use super::validation::{is_valid_email, is_valid_password, MIN_PASSWORD_LENGTH};
use super::{Backend, ServiceError, UpstreamContext};

/// Body of a single create, also one entry of a bulk create
#[derive(Debug, Clone, Default)]
pub struct NewUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    /// Defaults to confirmed
    pub email_confirmed: Option<bool>,
}

impl NewUserRequest {
    /// Read one entry field by field. A field of the wrong type counts as
    /// absent; only a literal `false` leaves the email unconfirmed.
    pub fn from_value(entry: &Value) -> Self {
        let text = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            email: text("email"),
            password: text("password"),
            email_confirmed: entry.get("email_confirmed").and_then(Value::as_bool),
        }
    }

    /// Every problem with this entry, in check order
    fn problems(&self) -> Vec<String> {
        let (Some(email), Some(password)) = (present(&self.email), present(&self.password)) else {
            return vec!["Email and password are required".to_string()];
        };
        let mut problems = Vec::new();
        if !is_valid_email(email) {
            problems.push("Invalid email format".to_string());
        }
        if !is_valid_password(password) {
            problems.push(format!(
                "Password must be at least {} characters long",
                MIN_PASSWORD_LENGTH
            ));
        }
        problems
    }

    fn to_identity(&self) -> NewIdentity {
        NewIdentity {
            email: self.email.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            email_confirm: self.email_confirmed != Some(false),
        }
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, Serialize)]
pub struct UserCreated {
    pub success: bool,
    pub user: CreatedUser,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkCreated {
    pub index: usize,
    pub email: String,
    pub id: Uuid,
    pub success: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub index: usize,
    pub email: String,
    pub error: String,
}

pub type BulkReport = BatchReport<BulkCreated, BulkFailure>;

pub struct UserService<'a> {
    backend: &'a Backend,
}

impl<'a> UserService<'a> {
    pub fn new(backend: &'a Backend) -> Self {
        Self { backend }
    }

    /// Every identity, newest first
    pub async fn list(&self) -> Result<ListResponse<AuthUser>, ServiceError> {
        let mut users = self
            .backend
            .identity
            .list_users()
            .await
            .context("Failed to fetch users")?;
        // None sorts before Some, so reversing puts undated users last
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(ListResponse::new(users))
    }

    pub async fn create(&self, request: &NewUserRequest) -> Result<UserCreated, ServiceError> {
        if let Some(problem) = request.problems().into_iter().next() {
            return Err(ServiceError::validation(problem));
        }

        let user = self
            .backend
            .identity
            .create_user(&request.to_identity())
            .await
            .context("Failed to create user")?;
        info!("Created user {}", user.id);

        Ok(UserCreated {
            success: true,
            user: CreatedUser::from(&user),
            message: "User created successfully".to_string(),
        })
    }

    /// Validate every entry, then create them one at a time
    pub async fn bulk_create(&self, body: &Value) -> Result<BulkReport, ServiceError> {
        let entries = match body.get("users") {
            Some(Value::Array(entries)) if !entries.is_empty() => entries,
            _ => {
                return Err(ServiceError::validation(
                    "Users array is required and must not be empty",
                ))
            }
        };

        let requests: Vec<NewUserRequest> = entries.iter().map(NewUserRequest::from_value).collect();

        let problems: Vec<String> = requests
            .iter()
            .enumerate()
            .flat_map(|(i, r)| {
                r.problems()
                    .into_iter()
                    .map(move |p| format!("User {}: {}", i + 1, p))
            })
            .collect();
        if !problems.is_empty() {
            return Err(ServiceError::Validation {
                message: "Validation errors".to_string(),
                details: Some(json!(problems)),
            });
        }

        let mut results = Vec::new();
        let mut errors = Vec::new();
        for (i, request) in requests.iter().enumerate() {
            let identity = request.to_identity();
            match self.backend.identity.create_user(&identity).await {
                Ok(user) => results.push(BulkCreated {
                    index: i + 1,
                    email: identity.email,
                    id: user.id,
                    success: true,
                }),
                Err(e) => {
                    error!("Error creating user {}: {}", identity.email, e);
                    errors.push(BulkFailure {
                        index: i + 1,
                        email: identity.email,
                        error: e.message(),
                    });
                }
            }
        }

        Ok(BatchReport::new("users", requests.len(), results, errors))
    }
}
