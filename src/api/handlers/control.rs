use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ledger::AnalyticsReset;
use crate::models::{Settings, TradingMode, TradingStatus};
use crate::AppState;

use super::ApiResponse;

#[derive(Serialize)]
pub struct ControlStatus {
    pub status: TradingStatus,
    pub mode: TradingMode,
    pub dry_run: bool,
    pub simulated: bool,
    pub monitor_alive: bool,
    pub live_credentials: bool,
    pub settings: Settings,
}

/// GET /api/control/status
pub async fn status(State(state): State<AppState>) -> Result<Json<ApiResponse<ControlStatus>>, AppError> {
    let settings = state.ledger.load_settings().await?;
    Ok(ApiResponse::ok(ControlStatus {
        status: settings.global_trading_status,
        mode: settings.global_trading_mode,
        dry_run: settings.dry_run_enabled,
        simulated: settings.is_simulated(),
        monitor_alive: state.controller.monitor_alive().await,
        live_credentials: state.config.has_trading_credentials(),
        settings,
    }))
}

/// POST /api/control/start
pub async fn start(State(state): State<AppState>) -> Result<Json<ApiResponse<Settings>>, AppError> {
    Ok(ApiResponse::ok(state.controller.start().await?))
}

/// POST /api/control/pause
pub async fn pause(State(state): State<AppState>) -> Result<Json<ApiResponse<Settings>>, AppError> {
    Ok(ApiResponse::ok(state.controller.pause().await?))
}

/// POST /api/control/stop. Returns once in-flight pipelines have drained.
pub async fn stop(State(state): State<AppState>) -> Result<Json<ApiResponse<Settings>>, AppError> {
    Ok(ApiResponse::ok(state.controller.stop().await?))
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SwitchModeRequest {
    pub mode: TradingMode,
    #[serde(default)]
    pub reset_analytics: bool,
}

/// POST /api/control/mode
pub async fn switch_mode(
    State(state): State<AppState>,
    Json(body): Json<SwitchModeRequest>,
) -> Result<Json<ApiResponse<Settings>>, AppError> {
    let settings = state
        .controller
        .switch_mode(body.mode, body.reset_analytics)
        .await?;
    Ok(ApiResponse::ok(settings))
}

/// POST /api/control/reset
pub async fn reset(State(state): State<AppState>) -> Result<Json<ApiResponse<AnalyticsReset>>, AppError> {
    Ok(ApiResponse::ok(state.controller.reset_analytics().await?))
}
