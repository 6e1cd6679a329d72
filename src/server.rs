use std::sync::Arc;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, ConfigError};
use crate::error::ApiError;
use crate::handlers;
use crate::seed::{SeedConfig, SeedError};
use crate::services::Backend;
use crate::supabase::SupabaseClient;

/// Which backend clients could be built at startup
#[derive(Debug, Clone, Serialize)]
pub struct ClientStatus {
    pub anon_configured: bool,
    pub service_role_configured: bool,
    /// Configuration messages for the clients that could not be built
    pub messages: Vec<String>,
}

#[derive(Clone)]
pub struct AppState {
    backend: Result<Backend, ConfigError>,
    pub seed: Arc<SeedConfig>,
    pub status: Arc<ClientStatus>,
    cors_origins: Arc<Vec<String>>,
    request_logging: bool,
}

impl AppState {
    /// Build clients from configuration. Missing credentials do not stop the
    /// server; routes needing the privileged client answer 500 instead.
    pub fn from_config(config: &AppConfig) -> Result<Self, SeedError> {
        let seed = SeedConfig::load(config.seed_file.as_deref())?;

        let backend = SupabaseClient::service_role(&config.supabase).map(|client| {
            let client = Arc::new(client);
            Backend::new(client.clone(), client)
        });
        let anon = SupabaseClient::anon(&config.supabase);

        let mut messages = Vec::new();
        if let Err(e) = &anon {
            tracing::warn!("Anon client unavailable: {}", e);
            messages.push(e.to_string());
        }
        if let Err(e) = &backend {
            tracing::warn!("Service role client unavailable: {}", e);
            messages.push(e.to_string());
        }

        let status = ClientStatus {
            anon_configured: anon.is_ok(),
            service_role_configured: backend.is_ok(),
            messages,
        };

        Ok(Self {
            backend,
            seed: Arc::new(seed),
            status: Arc::new(status),
            cors_origins: Arc::new(config.security.cors_origins.clone()),
            request_logging: config.api.enable_request_logging,
        })
    }

    /// State around an already-built backend
    pub fn new(backend: Backend, seed: SeedConfig) -> Self {
        Self {
            backend: Ok(backend),
            seed: Arc::new(seed),
            status: Arc::new(ClientStatus {
                anon_configured: true,
                service_role_configured: true,
                messages: vec![],
            }),
            cors_origins: Arc::new(vec![]),
            request_logging: false,
        }
    }

    pub fn backend(&self) -> Result<&Backend, ApiError> {
        self.backend.as_ref().map_err(|e| ApiError::from(e.clone()))
    }

    fn cors(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        if origins.is_empty() {
            return CorsLayer::permissive();
        }
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any)
    }
}

pub fn app(state: AppState) -> Router {
    let cors = state.cors();
    let request_logging = state.request_logging;

    let router = Router::new()
        // Public
        .route("/", get(handlers::status::root))
        .route("/health", get(handlers::status::health))
        .merge(user_routes())
        .merge(tenant_routes())
        .route("/api/profiles", get(handlers::profiles::legacy_list))
        .with_state(state)
        .layer(cors);

    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn user_routes() -> Router<AppState> {
    use handlers::users;

    Router::new().route(
        "/api/rcm/users",
        get(users::list).post(users::create).put(users::bulk_create),
    )
}

fn tenant_routes() -> Router<AppState> {
    use handlers::{mappings, profiles};

    Router::new()
        .route(
            "/api/rcm/:tenant/profiles",
            get(profiles::list)
                .post(profiles::seed)
                .put(profiles::reset_passwords)
                .delete(profiles::delete_outside_domains),
        )
        .route(
            "/api/rcm/:tenant/userprofilemapping",
            get(mappings::list).post(mappings::seed).delete(mappings::delete_all),
        )
        // same handlers under the table's own name
        .route(
            "/api/rcm/:tenant/profiles-projects-mapping",
            get(mappings::list).post(mappings::seed).delete(mappings::delete_all),
        )
}
