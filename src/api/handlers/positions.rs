use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::models::Position;
use crate::AppState;

use super::ApiResponse;

pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Position>>>, AppError> {
    Ok(ApiResponse::ok(state.ledger.list_positions().await?))
}
