//! HTTP API server for external control (UI chrome)
//!
//! This module provides a REST API for driving a call session:
//! - POST /call/join - Join a channel
//! - POST /call/leave - End the call
//! - POST /call/devices - Toggle microphone/camera
//! - POST /call/capture/start - Begin a capture cycle
//! - POST /call/capture/stop - Stop and upload the cycle
//! - GET /call/status - Query session status
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
