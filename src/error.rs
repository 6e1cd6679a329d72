// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Map, Value};

use crate::config::ConfigError;
use crate::services::ServiceError;
use crate::supabase::{QueryError, StoreError};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest {
        message: String,
        details: Option<Value>,
    },
    InvalidJson(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError {
        message: String,
        details: Option<Value>,
        /// Extra top-level fields such as partial counts
        extra: Map<String, Value>,
    },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError { .. } => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError { message, .. } => message,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest { .. } => "BAD_REQUEST",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError { .. } => "INTERNAL_SERVER_ERROR",
        }
    }

    pub fn details(&self) -> Option<&Value> {
        match self {
            ApiError::BadRequest { details, .. } => details.as_ref(),
            ApiError::InternalServerError { details, .. } => details.as_ref(),
            _ => None,
        }
    }

    /// Convert to JSON response body: `{ error, code, details?, ... }`
    pub fn to_json(&self) -> Value {
        let mut body = Map::new();
        body.insert("error".into(), Value::String(self.message().to_string()));
        body.insert("code".into(), Value::String(self.error_code().to_string()));
        if let Some(details) = self.details() {
            body.insert("details".into(), details.clone());
        }
        if let ApiError::InternalServerError { extra, .. } = self {
            for (k, v) in extra {
                body.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        Value::Object(body)
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>, details: Value) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    /// Upstream failure: generic message, upstream text in `details`
    pub fn upstream(message: impl Into<String>, details: impl Into<Value>) -> Self {
        ApiError::InternalServerError {
            message: message.into(),
            details: Some(details.into()),
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let ApiError::InternalServerError { extra, .. } = &mut self {
            extra.insert(key.to_string(), value.into());
        }
        self
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation { message, details } => ApiError::BadRequest { message, details },
            ServiceError::UnknownTenant(key) => ApiError::not_found(format!("Unknown tenant: {}", key)),
            ServiceError::Upstream { context, source } => {
                tracing::error!("{}: {}", context, source);
                ApiError::upstream(context, source.message())
            }
            ServiceError::Failed { message, details, extra } => {
                tracing::error!("{}: {}", message, details);
                ApiError::InternalServerError {
                    message,
                    details: Some(details),
                    extra,
                }
            }
            ServiceError::Query(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Backend error: {}", err);
        ApiError::upstream("Backend request failed", err.message())
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        tracing::error!("Query construction error: {}", err);
        ApiError::upstream("Internal server error", err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        tracing::error!("Configuration error: {}", err);
        ApiError::upstream("Internal server error", err.to_string())
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;
