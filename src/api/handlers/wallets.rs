use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::LeaderWallet;
use crate::services::operator;
use crate::AppState;

use super::ApiResponse;

#[derive(Debug, Deserialize)]
pub struct WalletQuery {
    #[serde(default)]
    pub active_only: bool,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<WalletQuery>,
) -> Result<Json<ApiResponse<Vec<LeaderWallet>>>, AppError> {
    Ok(ApiResponse::ok(state.ledger.list_wallets(query.active_only).await?))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddWalletRequest {
    pub address: String,
    pub nickname: Option<String>,
}

pub async fn add(
    State(state): State<AppState>,
    Json(body): Json<AddWalletRequest>,
) -> Result<(StatusCode, Json<ApiResponse<LeaderWallet>>), AppError> {
    let wallet =
        operator::add_wallet(state.ledger.as_ref(), &body.address, body.nickname.as_deref()).await?;
    Ok((StatusCode::CREATED, ApiResponse::ok(wallet)))
}

pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LeaderWallet>>, AppError> {
    Ok(ApiResponse::ok(
        operator::deactivate_wallet(state.ledger.as_ref(), id).await?,
    ))
}

pub async fn activate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LeaderWallet>>, AppError> {
    Ok(ApiResponse::ok(
        operator::activate_wallet(state.ledger.as_ref(), id).await?,
    ))
}
