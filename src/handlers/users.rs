use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::Value;

use crate::error::ApiResult;
use crate::models::{AuthUser, ListResponse};
use crate::server::AppState;
use crate::services::users::{BulkReport, NewUserRequest, UserCreated};
use crate::services::UserService;

use super::json_body;

/// GET /api/rcm/users
pub async fn list(State(state): State<AppState>) -> ApiResult<ListResponse<AuthUser>> {
    let backend = state.backend()?;
    let users = UserService::new(backend).list().await?;
    Ok(Json(users))
}

/// POST /api/rcm/users - create one confirmed (by default) user
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<UserCreated> {
    let request = NewUserRequest::from_value(&json_body(payload)?);
    let backend = state.backend()?;
    let created = UserService::new(backend).create(&request).await?;
    Ok(Json(created))
}

/// PUT /api/rcm/users - create every user in `{ users: [...] }`
pub async fn bulk_create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<BulkReport> {
    let body = json_body(payload)?;
    let backend = state.backend()?;
    let report = UserService::new(backend).bulk_create(&body).await?;
    Ok(Json(report))
}
