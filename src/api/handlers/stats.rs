use axum::extract::State;
use axum::Json;

use crate::errors::AppError;
use crate::ledger::TradingStats;
use crate::AppState;

use super::ApiResponse;

/// GET /api/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<ApiResponse<TradingStats>>, AppError> {
    Ok(ApiResponse::ok(state.ledger.trading_stats().await?))
}
