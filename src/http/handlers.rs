use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use super::state::AppState;
use crate::capture::CaptureState;
use crate::session::{CallSession, Role, SessionConfig};
use crate::translate::ClientId;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct JoinCallRequest {
    /// Channel to join.
    pub channel: String,

    /// Participant role (defaults to primary).
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub struct JoinCallResponse {
    pub channel: String,
    pub role: Role,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct LeaveCallResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SetDevicesRequest {
    pub mic: Option<bool>,
    pub camera: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SetDevicesResponse {
    pub mic_enabled: bool,
    pub camera_enabled: bool,

    /// Devices that could not be switched; their previous state stays in
    /// effect.
    pub degraded: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CaptureResponse {
    pub capture_state: CaptureState,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /call/join
/// Join a conferencing channel and bring the session up
pub async fn join_call(
    State(state): State<AppState>,
    Json(req): Json<JoinCallRequest>,
) -> impl IntoResponse {
    let role = req.role.unwrap_or(Role::Primary);
    info!("Join requested: channel={} role={:?}", req.channel, role);

    // Check if a call is already active
    {
        let call = state.call.read().await;
        if call.is_some() {
            return (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: "a call is already active".to_string(),
                }),
            )
                .into_response();
        }
    }

    let config = SessionConfig {
        app_id: state.config.conferencing.app_id.clone(),
        channel: req.channel.clone(),
        role,
        client_id: ClientId::now(),
        realtime_url: Some(state.config.translate.realtime_url.clone()),
        debounce_window: Duration::from_millis(state.config.translate.debounce_ms),
        avatar_render_url: state.config.avatar.render_url.clone(),
        spoken_language: state.config.avatar.spoken.clone(),
        signed_language: state.config.avatar.signed.clone(),
    };

    let session = match CallSession::join(
        config,
        Arc::clone(&state.conferencing),
        Arc::clone(&state.media_source),
        Arc::clone(&state.uploader),
    )
    .await
    {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to join call: {}", e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: format!("Failed to join call: {}", e),
                }),
            )
                .into_response();
        }
    };

    // Store session
    {
        let mut call = state.call.write().await;
        *call = Some(session);
    }

    info!("Joined channel {} as {:?}", req.channel, role);

    (
        StatusCode::OK,
        Json(JoinCallResponse {
            channel: req.channel,
            role,
            status: "joined".to_string(),
        }),
    )
        .into_response()
}

/// POST /call/leave
/// End the active call
pub async fn leave_call(State(state): State<AppState>) -> impl IntoResponse {
    let session = { state.call.write().await.take() };

    match session {
        Some(session) => {
            session.end().await;
            info!("Call ended");
            (
                StatusCode::OK,
                Json(LeaveCallResponse {
                    status: "left".to_string(),
                }),
            )
                .into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no active call".to_string(),
            }),
        )
            .into_response(),
    }
}

/// POST /call/devices
/// Apply microphone/camera toggles in order
pub async fn set_devices(
    State(state): State<AppState>,
    Json(req): Json<SetDevicesRequest>,
) -> impl IntoResponse {
    let session = { state.call.read().await.clone() };
    let Some(session) = session else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no active call".to_string(),
            }),
        )
            .into_response();
    };

    // Device failures degrade, they never fail the request.
    let mut degraded = Vec::new();
    if let Some(mic) = req.mic {
        if let Err(e) = session.set_mic(mic).await {
            degraded.push(format!("mic: {}", e));
        }
    }
    if let Some(camera) = req.camera {
        if let Err(e) = session.set_camera(camera).await {
            degraded.push(format!("camera: {}", e));
        }
    }

    let device = session.device_state().await;
    (
        StatusCode::OK,
        Json(SetDevicesResponse {
            mic_enabled: device.mic_enabled,
            camera_enabled: device.camera_enabled,
            degraded,
        }),
    )
        .into_response()
}

/// POST /call/capture/start
/// Begin a capture cycle on the live camera stream
pub async fn start_capture(State(state): State<AppState>) -> impl IntoResponse {
    let session = { state.call.read().await.clone() };
    let Some(session) = session else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no active call".to_string(),
            }),
        )
            .into_response();
    };

    match session.start_capture().await {
        Ok(()) => (
            StatusCode::OK,
            Json(CaptureResponse {
                capture_state: session.capture_state().await,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start capture: {}", e);
            (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// POST /call/capture/stop
/// Stop the capture cycle and issue the upload
pub async fn stop_capture(State(state): State<AppState>) -> impl IntoResponse {
    let session = { state.call.read().await.clone() };
    let Some(session) = session else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no active call".to_string(),
            }),
        )
            .into_response();
    };

    match session.stop_capture().await {
        Ok(()) => (
            StatusCode::OK,
            Json(CaptureResponse {
                capture_state: session.capture_state().await,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to stop capture: {}", e);
            (
                StatusCode::CONFLICT,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// GET /call/status
/// Snapshot of the active call
pub async fn call_status(State(state): State<AppState>) -> impl IntoResponse {
    let session = { state.call.read().await.clone() };

    match session {
        Some(session) => (StatusCode::OK, Json(session.stats().await)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "no active call".to_string(),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
