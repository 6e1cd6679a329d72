pub mod cascade;
pub mod mappings;
pub mod profiles;
pub mod tenants;
pub mod users;
pub mod validation;

pub use cascade::{CascadeDelete, CascadeOutcome};
pub use mappings::MappingService;
pub use profiles::ProfileService;
pub use tenants::Tenant;
pub use users::UserService;

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::supabase::{IdentityAdmin, QueryError, StoreError, TableStore};

/// Privileged collaborators every route works through
#[derive(Clone)]
pub struct Backend {
    pub store: Arc<dyn TableStore>,
    pub identity: Arc<dyn IdentityAdmin>,
}

impl Backend {
    pub fn new(store: Arc<dyn TableStore>, identity: Arc<dyn IdentityAdmin>) -> Self {
        Self { store, identity }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Rejected before any backend call
    #[error("{message}")]
    Validation {
        message: String,
        details: Option<Value>,
    },

    #[error("Unknown tenant: {0}")]
    UnknownTenant(String),

    #[error("{context}: {source}")]
    Upstream {
        context: String,
        #[source]
        source: StoreError,
    },

    /// Multi-step operation failed; `details` describes each failed step
    #[error("{message}")]
    Failed {
        message: String,
        details: Value,
        extra: Map<String, Value>,
    },

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation {
            message: message.into(),
            details: None,
        }
    }

    pub fn upstream(context: impl Into<String>, source: StoreError) -> Self {
        ServiceError::Upstream {
            context: context.into(),
            source,
        }
    }
}

/// Attach a context message to backend failures
pub(crate) trait UpstreamContext<T> {
    fn context(self, context: &str) -> Result<T, ServiceError>;
}

impl<T> UpstreamContext<T> for Result<T, StoreError> {
    fn context(self, context: &str) -> Result<T, ServiceError> {
        self.map_err(|e| ServiceError::upstream(context, e))
    }
}

/// Decode backend rows into typed records
pub(crate) fn decode_rows<T: serde::de::DeserializeOwned>(rows: Vec<Value>, context: &str) -> Result<Vec<T>, ServiceError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(|e| ServiceError::upstream(context, e.into())))
        .collect()
}
