use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::AppState;
use super::auth::require_auth;
use super::handlers;

pub fn create_router(state: AppState) -> Router {
    // Public routes, no authentication required
    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render));

    // Protected API routes. Bearer token required when API_TOKEN is set
    let protected = Router::new()
        // Control
        .route("/api/control/status", get(handlers::control::status))
        .route("/api/control/start", post(handlers::control::start))
        .route("/api/control/pause", post(handlers::control::pause))
        .route("/api/control/stop", post(handlers::control::stop))
        .route("/api/control/mode", post(handlers::control::switch_mode))
        .route("/api/control/reset", post(handlers::control::reset))
        // Settings
        .route(
            "/api/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        // Wallets
        .route("/api/wallets", get(handlers::wallets::list).post(handlers::wallets::add))
        .route("/api/wallets/:id/deactivate", post(handlers::wallets::deactivate))
        .route("/api/wallets/:id/activate", post(handlers::wallets::activate))
        // Trades
        .route("/api/trades/leader", get(handlers::trades::leader))
        .route("/api/trades/follower", get(handlers::trades::follower))
        // Positions
        .route("/api/positions", get(handlers::positions::list))
        // Stats
        .route("/api/stats", get(handlers::stats::stats))
        // Audit log
        .route("/api/events", get(handlers::events::list))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(protected)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
