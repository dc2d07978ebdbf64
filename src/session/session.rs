use std::sync::{Arc, RwLock};

use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::config::{Role, SessionConfig};
use super::stats::{CallStats, JoinState, Layout};
use crate::capture::{CaptureError, CapturePipeline, CaptureState, Uploader};
use crate::conferencing::ConferencingClient;
use crate::media::{DeviceError, DeviceState, MediaSource, TrackController, TrackKind};
use crate::translate::{render_url, QueryDebouncer, RenderQuery, TranslationChannel};

/// Fatal session failure: the user must not enter the call UI.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to join channel {channel}: {reason}")]
    ChannelJoinFailed { channel: String, reason: String },
}

/// Orchestrates one call.
///
/// Conferencing membership, local tracks, the capture pipeline, and the
/// translated-text-to-render-query flow all share this lifecycle. The
/// translation channel handle is owned here and nowhere else.
pub struct CallSession {
    config: SessionConfig,
    conferencing: Arc<dyn ConferencingClient>,
    tracks: Mutex<TrackController>,
    capture: Mutex<CapturePipeline>,
    translation: Mutex<Option<TranslationChannel>>,
    debouncer: QueryDebouncer,
    join_state: RwLock<JoinState>,
    router: Mutex<Option<JoinHandle<()>>>,
}

impl CallSession {
    /// Join the channel and bring the session up.
    ///
    /// Conferencing rejection is fatal. Device acquisition and translation
    /// channel failures degrade the session instead: the call continues
    /// with the affected feature off.
    pub async fn join(
        config: SessionConfig,
        conferencing: Arc<dyn ConferencingClient>,
        media_source: Arc<dyn MediaSource>,
        uploader: Arc<dyn Uploader>,
    ) -> Result<Arc<Self>, SessionError> {
        info!("Joining channel {} as {:?}", config.channel, config.role);

        conferencing
            .join(&config.app_id, &config.channel, None)
            .await
            .map_err(|e| SessionError::ChannelJoinFailed {
                channel: config.channel.clone(),
                reason: e.to_string(),
            })?;

        // Local tracks per the role's initial device state. Failures leave
        // the device off and the call running.
        let mut tracks = TrackController::new(media_source, config.role.initial_device_state());
        for failure in tracks.acquire_initial().await {
            warn!("Device degraded at join: {}", failure);
        }
        for stream in [tracks.audio_stream(), tracks.video_stream()]
            .into_iter()
            .flatten()
        {
            if stream.is_enabled() {
                if let Err(e) = conferencing.publish(Arc::clone(&stream)).await {
                    warn!("Failed to publish {:?} track: {}", stream.kind(), e);
                }
            }
        }

        let debouncer = QueryDebouncer::new(config.debounce_window);

        // Translation channel, keyed by the per-session client id. A
        // failed connect degrades to a call without translations.
        let translation = match &config.realtime_url {
            Some(endpoint) => {
                match TranslationChannel::connect(endpoint, &config.client_id).await {
                    Ok(channel) => Some(channel),
                    Err(e) => {
                        warn!("Translation channel unavailable: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        let session = Arc::new(Self {
            config,
            conferencing,
            tracks: Mutex::new(tracks),
            capture: Mutex::new(CapturePipeline::new(uploader)),
            translation: Mutex::new(translation),
            debouncer,
            join_state: RwLock::new(JoinState::Joining),
            router: Mutex::new(None),
        });

        // Route translated text into the debouncer, latest-wins end to
        // end. The router holds only a weak handle so it cannot keep a
        // dead session alive.
        let messages = {
            let translation = session.translation.lock().await;
            translation.as_ref().map(|channel| channel.messages())
        };
        if let Some(mut messages) = messages {
            let weak = Arc::downgrade(&session);
            let task = tokio::spawn(async move {
                while messages.changed().await.is_ok() {
                    let text = messages.borrow_and_update().as_ref().map(|m| m.text.clone());
                    let Some(text) = text else { continue };
                    let Some(session) = weak.upgrade() else { break };
                    session.debouncer.submit(text);
                }
            });
            *session.router.lock().await = Some(task);
        }

        *session.join_state.write().unwrap() = JoinState::Joined;
        info!("Joined channel {}", session.config.channel);
        Ok(session)
    }

    /// Toggle the microphone. Never tears the session down.
    pub async fn set_mic(&self, enabled: bool) -> Result<DeviceState, DeviceError> {
        self.set_device(TrackKind::Audio, enabled).await
    }

    /// Toggle the camera. Never tears the session down.
    pub async fn set_camera(&self, enabled: bool) -> Result<DeviceState, DeviceError> {
        self.set_device(TrackKind::Video, enabled).await
    }

    async fn set_device(
        &self,
        kind: TrackKind,
        enabled: bool,
    ) -> Result<DeviceState, DeviceError> {
        // The tracks lock is held across the publish step so toggles land
        // in the order issued.
        let mut tracks = self.tracks.lock().await;
        let result = match kind {
            TrackKind::Audio => tracks.set_mic(enabled).await,
            TrackKind::Video => tracks.set_camera(enabled).await,
        };
        if let Err(e) = result {
            warn!("Device toggle failed, keeping previous state: {}", e);
            return Err(e);
        }

        // Re-publish or withdraw without leaving the channel.
        let stream = match kind {
            TrackKind::Audio => tracks.audio_stream(),
            TrackKind::Video => tracks.video_stream(),
        };
        if enabled {
            if let Some(stream) = stream {
                if let Err(e) = self.conferencing.publish(stream).await {
                    warn!("Failed to publish {:?} track: {}", kind, e);
                }
            }
        } else if let Err(e) = self.conferencing.unpublish(kind).await {
            warn!("Failed to unpublish {:?} track: {}", kind, e);
        }

        Ok(tracks.state())
    }

    /// Start a capture cycle on the live camera stream.
    pub async fn start_capture(&self) -> Result<(), CaptureError> {
        let stream = { self.tracks.lock().await.video_stream() };
        let mut capture = self.capture.lock().await;
        capture.start_capture(stream.as_ref())
    }

    /// Stop the capture cycle and issue the upload.
    pub async fn stop_capture(&self) -> Result<(), CaptureError> {
        let mut capture = self.capture.lock().await;
        capture.stop_capture().await
    }

    pub async fn capture_state(&self) -> CaptureState {
        self.capture.lock().await.state()
    }

    /// Feed typed text into the render query flow.
    pub fn submit_text(&self, text: impl Into<String>) {
        self.debouncer.submit(text);
    }

    /// Latest render query, if the debounce window has produced one.
    pub fn render_query(&self) -> Option<RenderQuery> {
        self.debouncer.current()
    }

    /// Subscribe to emitted render queries.
    pub fn render_queries(&self) -> watch::Receiver<Option<RenderQuery>> {
        self.debouncer.queries()
    }

    /// Avatar widget URL for the current render query.
    pub fn avatar_url(&self) -> Option<String> {
        let query = self.render_query()?;
        if query.is_empty() {
            return None;
        }
        Some(render_url(
            &self.config.avatar_render_url,
            &query,
            &self.config.spoken_language,
            &self.config.signed_language,
        ))
    }

    /// The secondary participant sees the floating translation overlay
    /// once a render query is available; the primary never does.
    pub fn overlay_visible(&self) -> bool {
        self.config.role == Role::Secondary
            && self.render_query().map(|q| !q.is_empty()).unwrap_or(false)
    }

    /// Layout derived from the remote roster.
    pub fn layout(&self) -> Layout {
        Layout::for_remote_count(self.conferencing.remotes().len())
    }

    pub fn join_state(&self) -> JoinState {
        *self.join_state.read().unwrap()
    }

    pub fn role(&self) -> Role {
        self.config.role
    }

    pub fn channel(&self) -> &str {
        &self.config.channel
    }

    pub async fn device_state(&self) -> DeviceState {
        self.tracks.lock().await.state()
    }

    pub async fn stats(&self) -> CallStats {
        let device = self.device_state().await;
        let capture_state = self.capture_state().await;
        CallStats {
            channel: self.config.channel.clone(),
            role: self.config.role,
            join_state: self.join_state(),
            mic_enabled: device.mic_enabled,
            camera_enabled: device.camera_enabled,
            capture_state,
            remote_participants: self.conferencing.remotes().len(),
            layout: self.layout(),
            overlay_visible: self.overlay_visible(),
            render_query: self.render_query().map(|q| q.as_str().to_string()),
        }
    }

    /// End the call: leave the channel, close the translation channel, and
    /// discard any in-progress capture without uploading.
    ///
    /// Uploads already issued by finished cycles are not awaited.
    pub async fn end(&self) {
        {
            let mut state = self.join_state.write().unwrap();
            if *state == JoinState::Left {
                return;
            }
            *state = JoinState::Left;
        }

        info!("Ending call in channel {}", self.config.channel);

        if let Some(task) = self.router.lock().await.take() {
            task.abort();
        }
        if let Some(channel) = self.translation.lock().await.take() {
            channel.close();
        }
        self.capture.lock().await.abandon().await;
        if let Err(e) = self.conferencing.leave().await {
            warn!("Failed to leave channel cleanly: {}", e);
        }
    }
}
