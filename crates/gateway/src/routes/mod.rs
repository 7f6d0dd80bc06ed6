//! HTTP route handlers for the gateway.
//!
//! # Route Structure
//!
//! ```text
//! GET     /health            - Liveness check (not gated)
//!
//! # Storefront API (access gate: allowed origins, POST only)
//! OPTIONS /api/track-order   - Preflight
//! POST    /api/track-order   - Resolve an order's fulfillment and tracking
//! OPTIONS /api/claude        - Preflight
//! POST    /api/claude        - Relay a chat request to Claude
//! ```

pub mod claude;
pub mod track_order;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::access_gate_middleware;
use crate::state::AppState;

/// Create the gated storefront API router.
///
/// The access gate wraps every route here, so preflights, rejections and
/// handler errors all leave through the same header-setting step.
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/track-order", post(track_order::track_order))
        .route("/claude", post(claude::relay))
        .layer(middleware::from_fn_with_state(state, access_gate_middleware))
}

/// Create all routes for the gateway.
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes(state))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check upstreams.
async fn health() -> &'static str {
    "ok"
}
