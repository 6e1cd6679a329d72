use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::server::AppState;

/// GET / - service description and client configuration
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    let tenants: Vec<&str> = state.seed.tenants.iter().map(|t| t.key.as_str()).collect();
    Json(json!({
        "name": "RCM Admin API",
        "version": version,
        "description": "User, profile and project mapping administration across tenant schemas",
        "clients": state.status.as_ref(),
        "tenants": tenants,
        "endpoints": {
            "users": "/api/rcm/users (GET list, POST create, PUT bulk create)",
            "profiles": "/api/rcm/:tenant/profiles (GET list, POST seed, PUT reset passwords, DELETE prune)",
            "mappings": "/api/rcm/:tenant/userprofilemapping (GET list, POST seed, DELETE all)",
            "legacy": "/api/profiles (GET ebv profiles)",
        }
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
        "service_role_configured": state.status.service_role_configured,
    }))
}
