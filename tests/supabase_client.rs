mod common;

use serde_json::json;
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

use rcm_admin_api::models::NewIdentity;
use rcm_admin_api::supabase::{
    Condition, IdentityAdmin, OrderBy, Scope, SelectQuery, StoreError, TableRef, TableStore,
};

use common::{auth_user, service_client, SERVICE_KEY};

fn profiles(schema: &str) -> TableRef {
    TableRef::new(schema, "profiles").unwrap()
}

#[tokio::test]
async fn select_sends_schema_profile_and_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(header("apikey", SERVICE_KEY))
        .and(header("authorization", format!("Bearer {}", SERVICE_KEY).as_str()))
        .and(header("accept-profile", "ehs_pa"))
        .and(query_param("select", "id,email"))
        .and(query_param("email", "like.*@acme.com"))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a3f1c2d4-0000-4000-8000-000000000001", "email": "aarav.sharma@acme.com"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let query = SelectQuery::new()
        .columns(&["id", "email"])
        .filter(Condition::like("email", "*@acme.com"))
        .order(OrderBy::desc("created_at"));
    let rows = service_client(&server).select(&profiles("ehs_pa"), &query).await.unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["email"], "aarav.sharma@acme.com");
}

#[tokio::test]
async fn insert_writes_to_content_profile_and_returns_row() {
    let server = MockServer::start().await;
    let row = json!({"id": "a3f1c2d4-0000-4000-8000-000000000001", "email": "aarav.sharma@acme.com"});

    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .and(header("content-profile", "ehs_ar"))
        .and(header("prefer", "return=representation"))
        .and(body_json(&row))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row.clone()])))
        .expect(1)
        .mount(&server)
        .await;

    let stored = service_client(&server).insert(&profiles("ehs_ar"), &row).await.unwrap();
    assert_eq!(stored, row);
}

#[tokio::test]
async fn update_all_uses_explicit_not_null_filter() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/profiles"))
        .and(header("content-profile", "ehs_pa"))
        .and(query_param("id", "not.is.null"))
        .and(query_param("select", "id,email"))
        .and(body_json(json!({"password": "hash"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "1", "email": "a@acme.com"},
            {"id": "2", "email": "b@dollar.care"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = service_client(&server)
        .update(&profiles("ehs_pa"), &json!({"password": "hash"}), &Scope::All, &["id", "email"])
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[tokio::test]
async fn delete_renders_in_list() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/refresh_tokens"))
        .and(header("content-profile", "ehs_ar"))
        .and(query_param("user_id", "in.(u1,u2)"))
        .and(query_param("select", "*"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let table = TableRef::new("ehs_ar", "refresh_tokens").unwrap();
    let scope = Scope::matching(Condition::is_in("user_id", ["u1", "u2"]));
    let rows = service_client(&server).delete(&table, &scope, &[]).await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn empty_scope_never_reaches_the_backend() {
    let server = MockServer::start().await;

    let err = service_client(&server)
        .delete(&profiles("ehs_pa"), &Scope::Matching(vec![]), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Query(_)));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn postgrest_error_body_is_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "details": "Key (id)=(a3f1) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"profiles_pkey\""
        })))
        .mount(&server)
        .await;

    let err = service_client(&server)
        .insert(&profiles("ehs_pa"), &json!({"id": "a3f1"}))
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some("23505"));
    assert_eq!(err.message(), "duplicate key value violates unique constraint \"profiles_pkey\"");
    match err {
        StoreError::Api { status, details, .. } => {
            assert_eq!(status, 409);
            assert_eq!(details.as_deref(), Some("Key (id)=(a3f1) already exists."));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn list_users_walks_every_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                auth_user("0b6f8a52-0000-4000-8000-000000000001", "aarav.sharma@acme.com", "2024-05-01T10:00:00Z"),
                auth_user("0b6f8a52-0000-4000-8000-000000000002", "sanya.kapoor@acme.com", "2024-05-02T10:00:00Z")
            ],
            "aud": "authenticated"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/v1/admin/users"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [
                auth_user("0b6f8a52-0000-4000-8000-000000000003", "anjali.desai@dollar.care", "2024-05-03T10:00:00Z")
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let users = service_client(&server).list_users().await.unwrap();
    assert_eq!(users.len(), 3);
    assert_eq!(users[2].email.as_deref(), Some("anjali.desai@dollar.care"));
    let identities = users[0].identities.as_ref().unwrap();
    assert_eq!(identities[0].provider, "email");
}

#[tokio::test]
async fn create_user_posts_admin_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .and(header("apikey", SERVICE_KEY))
        .and(body_json(json!({
            "email": "new.hire@acme.com",
            "password": "secret1",
            "email_confirm": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_user(
            "0b6f8a52-0000-4000-8000-00000000000a",
            "new.hire@acme.com",
            "2024-06-01T08:30:00.123456Z",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let identity = NewIdentity {
        email: "new.hire@acme.com".to_string(),
        password: "secret1".to_string(),
        email_confirm: true,
    };
    let user = service_client(&server).create_user(&identity).await.unwrap();
    assert_eq!(user.email.as_deref(), Some("new.hire@acme.com"));
    assert!(user.email_confirmed_at.is_some());
}

#[tokio::test]
async fn gotrue_error_message_is_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/admin/users"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 422,
            "error_code": "email_exists",
            "msg": "A user with this email address has already been registered"
        })))
        .mount(&server)
        .await;

    let identity = NewIdentity {
        email: "aarav.sharma@acme.com".to_string(),
        password: "secret1".to_string(),
        email_confirm: true,
    };
    let err = service_client(&server).create_user(&identity).await.unwrap_err();
    assert_eq!(err.message(), "A user with this email address has already been registered");
}
