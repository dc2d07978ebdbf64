use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::media::DeviceState;
use crate::translate::ClientId;

/// Participant role, carried in the join request.
///
/// Display-only branching, not a protocol difference: the secondary
/// participant defaults the microphone off and sees the translation
/// overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Primary,
    Secondary,
}

impl Role {
    /// Initial device state for the role.
    pub fn initial_device_state(self) -> DeviceState {
        DeviceState {
            mic_enabled: self == Role::Primary,
            camera_enabled: true,
        }
    }
}

/// Configuration for one call session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Conferencing application identifier.
    pub app_id: String,

    /// Channel to join.
    pub channel: String,

    /// Participant role.
    pub role: Role,

    /// Identity for the realtime channel. Unique per session.
    pub client_id: ClientId,

    /// Realtime translation endpoint (`ws://host`). `None` disables the
    /// translation channel for this session.
    pub realtime_url: Option<String>,

    /// Quiet period before a render query is emitted.
    pub debounce_window: Duration,

    /// Avatar render service base URL.
    pub avatar_render_url: String,

    /// Spoken language code for the render query.
    pub spoken_language: String,

    /// Signed language variant for the render query.
    pub signed_language: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_id: "dev-app".to_string(),
            channel: format!("call-{}", uuid::Uuid::new_v4()),
            role: Role::Primary,
            client_id: ClientId::now(),
            realtime_url: None,
            debounce_window: Duration::from_millis(1000),
            avatar_render_url:
                "https://us-central1-sign-mt.cloudfunctions.net/spoken_text_to_signed_pose"
                    .to_string(),
            spoken_language: "en".to_string(),
            signed_language: "ase".to_string(),
        }
    }
}
