use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::models::{Settings, SettingsUpdate};
use crate::AppState;

use super::ApiResponse;

pub async fn get_settings(State(state): State<AppState>) -> Result<Json<ApiResponse<Settings>>, AppError> {
    Ok(ApiResponse::ok(state.ledger.load_settings().await?))
}

/// Unknown fields are rejected by the extractor before reaching here.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<ApiResponse<Settings>>, AppError> {
    Ok(ApiResponse::ok(state.controller.update_settings(update).await?))
}
