use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("Refusing to {0} without a filter; use Scope::All to affect every row")]
    EmptyScope(&'static str),

    #[error("Invalid filter value for {column}: {reason}")]
    InvalidValue { column: String, reason: String },
}

/// Failures reported by the table store or the identity admin API
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// The upstream service answered with an error body
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        details: Option<String>,
        hint: Option<String>,
    },

    /// The request never produced a usable answer
    #[error("Request to backend failed: {0}")]
    Transport(String),

    #[error("Unexpected response from backend: {0}")]
    Decode(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    /// A single-row query matched nothing
    #[error("No rows returned for {0}")]
    NoRows(String),
}

impl StoreError {
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        StoreError::Api {
            status,
            message: message.into(),
            code: None,
            details: None,
            hint: None,
        }
    }

    pub fn with_code(self, code: impl Into<String>) -> Self {
        match self {
            StoreError::Api { status, message, details, hint, .. } => StoreError::Api {
                status,
                message,
                code: Some(code.into()),
                details,
                hint,
            },
            other => other,
        }
    }

    /// Build an `Api` error from a PostgREST or GoTrue error body.
    ///
    /// PostgREST sends `{code, details, hint, message}`; GoTrue uses one of
    /// `msg`, `message`, `error_description` or `error`.
    pub fn from_body(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let field = |name: &str| -> Option<String> {
            parsed.as_ref().and_then(|v| match v.get(name) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => None,
            })
        };

        let message = field("message")
            .or_else(|| field("msg"))
            .or_else(|| field("error_description"))
            .or_else(|| field("error"))
            .unwrap_or_else(|| {
                if body.trim().is_empty() {
                    format!("Backend returned status {}", status)
                } else {
                    body.trim().to_string()
                }
            });

        StoreError::Api {
            status,
            message,
            code: field("code").or_else(|| field("error_code")),
            details: field("details"),
            hint: field("hint"),
        }
    }

    /// Text surfaced to API callers in the `details` field
    pub fn message(&self) -> String {
        match self {
            StoreError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else {
            StoreError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}
