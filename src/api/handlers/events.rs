use axum::extract::{Query, State};
use axum::Json;

use crate::errors::AppError;
use crate::models::SystemEvent;
use crate::AppState;

use super::{ApiResponse, ListQuery};

/// Newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<SystemEvent>>>, AppError> {
    Ok(ApiResponse::ok(state.ledger.list_events(query.limit()).await?))
}
