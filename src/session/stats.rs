use serde::{Deserialize, Serialize};

use super::config::Role;
use crate::capture::CaptureState;

/// Join status of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinState {
    Joining,
    Joined,
    Left,
}

/// Remote participant layout.
///
/// Exactly one remote yields the small picture-in-picture surface for the
/// local view; any other count fills the surface. Deterministic, not
/// negotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    FullSurface,
    PictureInPicture,
}

impl Layout {
    pub fn for_remote_count(count: usize) -> Self {
        if count == 1 {
            Layout::PictureInPicture
        } else {
            Layout::FullSurface
        }
    }
}

/// Snapshot of a call session for the control API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallStats {
    /// Channel the session joined.
    pub channel: String,

    /// Participant role.
    pub role: Role,

    /// Join status.
    pub join_state: JoinState,

    /// Whether the microphone is live.
    pub mic_enabled: bool,

    /// Whether the camera is live.
    pub camera_enabled: bool,

    /// Capture pipeline state.
    pub capture_state: CaptureState,

    /// Number of remote participants.
    pub remote_participants: usize,

    /// Layout derived from the remote count.
    pub layout: Layout,

    /// Whether the translation overlay is showing.
    pub overlay_visible: bool,

    /// Current render query, if the debounce window has produced one.
    pub render_query: Option<String>,
}
