// Route handlers. Each one resolves the backend from state, runs a service
// operation and returns its JSON; failures become `ApiError` responses.
pub mod mappings;
pub mod profiles;
pub mod status;
pub mod users;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::ApiError;

/// Unwrap a JSON body, turning extractor rejections into 400 responses
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ApiError::invalid_json(format!("Invalid JSON body: {}", rejection.body_text())))
}
