use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::ApiResult;
use crate::models::{ListResponse, ProfileView};
use crate::server::AppState;
use crate::services::profiles::{DomainCleanup, PasswordReset, ProfileSeedReport};
use crate::services::ProfileService;

const LEGACY_TENANT: &str = "ebv";

/// GET /api/rcm/:tenant/profiles
pub async fn list(State(state): State<AppState>, Path(tenant): Path<String>) -> ApiResult<ListResponse<ProfileView>> {
    let backend = state.backend()?;
    let profiles = ProfileService::new(backend, &state.seed, &tenant)?.list().await?;
    Ok(Json(profiles))
}

/// POST /api/rcm/:tenant/profiles - insert the demo profiles
pub async fn seed(State(state): State<AppState>, Path(tenant): Path<String>) -> ApiResult<ProfileSeedReport> {
    let backend = state.backend()?;
    let report = ProfileService::new(backend, &state.seed, &tenant)?.seed().await?;
    Ok(Json(report))
}

/// PUT /api/rcm/:tenant/profiles - reset every password to the tenant hash
pub async fn reset_passwords(State(state): State<AppState>, Path(tenant): Path<String>) -> ApiResult<PasswordReset> {
    let backend = state.backend()?;
    let reset = ProfileService::new(backend, &state.seed, &tenant)?
        .reset_passwords()
        .await?;
    Ok(Json(reset))
}

/// DELETE /api/rcm/:tenant/profiles - prune profiles outside the allowed domains
pub async fn delete_outside_domains(
    State(state): State<AppState>,
    Path(tenant): Path<String>,
) -> ApiResult<DomainCleanup> {
    let backend = state.backend()?;
    let cleanup = ProfileService::new(backend, &state.seed, &tenant)?
        .delete_outside_domains()
        .await?;
    Ok(Json(cleanup))
}

/// GET /api/profiles
pub async fn legacy_list(State(state): State<AppState>) -> ApiResult<ListResponse<ProfileView>> {
    let backend = state.backend()?;
    let profiles = ProfileService::new(backend, &state.seed, LEGACY_TENANT)?.list().await?;
    Ok(Json(profiles))
}
