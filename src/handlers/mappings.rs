use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::ApiResult;
use crate::models::{ListResponse, MappingView};
use crate::server::AppState;
use crate::services::mappings::{MappingCleanup, MappingSeedReport};
use crate::services::MappingService;

pub async fn list(State(state): State<AppState>, Path(tenant): Path<String>) -> ApiResult<ListResponse<MappingView>> {
    let backend = state.backend()?;
    let mappings = MappingService::new(backend, &state.seed, &tenant)?.list().await?;
    Ok(Json(mappings))
}

pub async fn seed(State(state): State<AppState>, Path(tenant): Path<String>) -> ApiResult<MappingSeedReport> {
    let backend = state.backend()?;
    let report = MappingService::new(backend, &state.seed, &tenant)?.seed().await?;
    Ok(Json(report))
}

pub async fn delete_all(State(state): State<AppState>, Path(tenant): Path<String>) -> ApiResult<MappingCleanup> {
    let backend = state.backend()?;
    let cleanup = MappingService::new(backend, &state.seed, &tenant)?.delete_all().await?;
    Ok(Json(cleanup))
}
