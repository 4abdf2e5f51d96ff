use axum::extract::{Query, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::{FollowerTrade, LeaderTrade};
use crate::AppState;

use super::{ApiResponse, ListQuery};

pub async fn leader(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<LeaderTrade>>>, AppError> {
    Ok(ApiResponse::ok(state.ledger.list_leader_trades(query.limit()).await?))
}

pub async fn follower(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<FollowerTrade>>>, AppError> {
    Ok(ApiResponse::ok(state.ledger.list_follower_trades(query.limit()).await?))
}
