#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::MockServer;

use rcm_admin_api::config::{AppConfig, SupabaseConfig};
use rcm_admin_api::server::{app, AppState};
use rcm_admin_api::supabase::SupabaseClient;

pub const SERVICE_KEY: &str = "service-role-test-key";
pub const ANON_KEY: &str = "anon-test-key";

/// Supabase settings pointing at the mock server. Small pages make the
/// identity listing paginate.
pub fn supabase_config(server: &MockServer) -> SupabaseConfig {
    SupabaseConfig {
        url: Some(server.uri()),
        anon_key: Some(ANON_KEY.to_string()),
        service_role_key: Some(SERVICE_KEY.to_string()),
        request_timeout_secs: 5,
        users_per_page: 2,
    }
}

pub fn service_client(server: &MockServer) -> SupabaseClient {
    SupabaseClient::service_role(&supabase_config(server)).expect("service client builds")
}

/// Full router wired to the mock backend with the built-in seed data
pub fn router(server: &MockServer) -> Router {
    let mut config = AppConfig::development();
    config.supabase = supabase_config(server);
    let state = AppState::from_config(&config).expect("state builds");
    app(state)
}

pub fn auth_user(id: &str, email: &str, created_at: &str) -> Value {
    json!({
        "id": id,
        "aud": "authenticated",
        "role": "authenticated",
        "email": email,
        "phone": "",
        "created_at": created_at,
        "updated_at": created_at,
        "email_confirmed_at": created_at,
        "last_sign_in_at": null,
        "is_anonymous": false,
        "app_metadata": {"provider": "email", "providers": ["email"]},
        "user_metadata": {},
        "identities": [{
            "identity_id": "0d3a3a4e-1111-4a4a-9c9c-000000000000",
            "id": id,
            "user_id": id,
            "provider": "email",
            "identity_data": {"email": email},
            "created_at": created_at,
            "updated_at": created_at
        }]
    })
}

pub async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header("content-type", "application/json");
    }
    let request = request
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .expect("request builds");

    let response = app.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body reads");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}
