use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use super::handlers;
use super::state::AppState;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Call lifecycle
        .route("/call/join", post(handlers::join_call))
        .route("/call/leave", post(handlers::leave_call))
        // Device toggles
        .route("/call/devices", post(handlers::set_devices))
        // Capture control
        .route("/call/capture/start", post(handlers::start_capture))
        .route("/call/capture/stop", post(handlers::stop_capture))
        // Session queries
        .route("/call/status", get(handlers::call_status))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
