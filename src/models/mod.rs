pub mod auth_user;
pub mod mapping;
pub mod profile;
pub mod project;

pub use auth_user::{AuthUser, CreatedUser, Identity, NewIdentity};
pub use mapping::{MappingRow, MappingView, NewMapping};
pub use profile::{display_name, NewProfile, ProfileRow, ProfileView, Role};
pub use project::ProjectRow;

use serde::Serialize;

/// `{ items, total }` envelope used by every listing endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T: Serialize> ListResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        let total = items.len();
        Self { items, total }
    }
}

/// Outcome of a batch of independent inserts. Failures never abort the batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<R: Serialize, E: Serialize> {
    pub success: bool,
    pub created: usize,
    pub failed: usize,
    pub total: usize,
    pub results: Vec<R>,
    pub errors: Vec<E>,
    pub message: String,
}

impl<R: Serialize, E: Serialize> BatchReport<R, E> {
    pub fn new(noun: &str, total: usize, results: Vec<R>, errors: Vec<E>) -> Self {
        let message = format!(
            "Successfully created {} out of {} {}",
            results.len(),
            total,
            noun
        );
        Self {
            success: true,
            created: results.len(),
            failed: errors.len(),
            total,
            results,
            errors,
            message,
        }
    }
}

/// Per-record failure in a seed run
#[derive(Debug, Clone, Serialize)]
pub struct SeedFailure {
    pub email: String,
    pub error: String,
}
