use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing Supabase configuration. Set {0} to continue.")]
    Missing(&'static str),

    #[error("Invalid Supabase URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub supabase: SupabaseConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
    /// Optional YAML file replacing the built-in seed configuration
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

/// Connection settings for the hosted backend. Values stay optional here;
/// the client constructors decide which ones they require.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupabaseConfig {
    pub url: Option<String>,
    pub anon_key: Option<String>,
    #[serde(skip_serializing)]
    pub service_role_key: Option<String>,
    pub request_timeout_secs: u64,
    /// Page size used when walking the identity admin listing
    pub users_per_page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub cors_origins: Vec<String>,
}

impl SupabaseConfig {
    pub fn from_env() -> Self {
        Self {
            url: non_empty_var("SUPABASE_URL"),
            anon_key: non_empty_var("SUPABASE_ANON_KEY"),
            service_role_key: non_empty_var("SUPABASE_SERVICE_ROLE_KEY"),
            request_timeout_secs: 30,
            users_per_page: 1000,
        }
    }

    pub fn require_url(&self) -> Result<&str, ConfigError> {
        self.url.as_deref().ok_or(ConfigError::Missing("SUPABASE_URL"))
    }

    pub fn require_anon_key(&self) -> Result<&str, ConfigError> {
        self.anon_key
            .as_deref()
            .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))
    }

    pub fn require_service_role_key(&self) -> Result<&str, ConfigError> {
        self.service_role_key
            .as_deref()
            .ok_or(ConfigError::Missing("SUPABASE_SERVICE_ROLE_KEY"))
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        let defaults = self.supabase.clone();
        self.supabase = SupabaseConfig {
            request_timeout_secs: defaults.request_timeout_secs,
            users_per_page: defaults.users_per_page,
            ..SupabaseConfig::from_env()
        };

        if let Ok(v) = env::var("API_REQUEST_TIMEOUT_SECS") {
            self.supabase.request_timeout_secs = v.parse().unwrap_or(self.supabase.request_timeout_secs);
        }
        if let Ok(v) = env::var("API_USERS_PER_PAGE") {
            self.supabase.users_per_page = v
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .unwrap_or(self.supabase.users_per_page);
        }

        // Allow tests or deployments to override port via env
        if let Some(port) = env::var("RCM_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.api.port = port;
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        if let Ok(v) = env::var("LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Ok(v) = env::var("LOG_JSON") {
            self.logging.json = v.parse().unwrap_or(self.logging.json);
        }

        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self.seed_file = non_empty_var("RCM_SEED_FILE");

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            supabase: SupabaseConfig {
                request_timeout_secs: 30,
                users_per_page: 1000,
                ..Default::default()
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                json: false,
            },
            security: SecurityConfig {
                // Empty list means permissive CORS
                cors_origins: vec![],
            },
            seed_file: None,
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            supabase: SupabaseConfig {
                request_timeout_secs: 15,
                users_per_page: 500,
                ..Default::default()
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: true,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://staging.example.com".to_string()],
            },
            seed_file: None,
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            supabase: SupabaseConfig {
                request_timeout_secs: 10,
                users_per_page: 500,
                ..Default::default()
            },
            api: ApiConfig {
                port: 3000,
                enable_request_logging: false,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                json: true,
            },
            security: SecurityConfig {
                cors_origins: vec!["https://app.example.com".to_string()],
            },
            seed_file: None,
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
