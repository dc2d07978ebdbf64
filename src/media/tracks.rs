use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::info;

use super::stream::{DeviceError, MediaSource, MediaStream, TrackKind};

/// Microphone/camera on-off state, a single value object.
///
/// Consumers (the conferencing publisher, the capture pipeline) subscribe
/// through [`TrackController::device_state`] instead of keeping their own
/// copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub mic_enabled: bool,
    pub camera_enabled: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            mic_enabled: true,
            camera_enabled: true,
        }
    }
}

/// Owns local device acquisition and the on/off state.
///
/// Toggles never tear the session down; they only change what is published
/// and captured. Both consumers observe the same live [`MediaStream`]
/// instance, never a copy. Toggles are applied in the order issued.
pub struct TrackController {
    source: Arc<dyn MediaSource>,
    audio: Option<Arc<MediaStream>>,
    video: Option<Arc<MediaStream>>,
    state_tx: watch::Sender<DeviceState>,
}

impl TrackController {
    pub fn new(source: Arc<dyn MediaSource>, initial: DeviceState) -> Self {
        let (state_tx, _) = watch::channel(initial);
        Self {
            source,
            audio: None,
            video: None,
            state_tx,
        }
    }

    /// Current device state.
    pub fn state(&self) -> DeviceState {
        *self.state_tx.borrow()
    }

    /// Subscribe to device state changes (latest-wins).
    pub fn device_state(&self) -> watch::Receiver<DeviceState> {
        self.state_tx.subscribe()
    }

    pub fn audio_stream(&self) -> Option<Arc<MediaStream>> {
        self.audio.clone()
    }

    pub fn video_stream(&self) -> Option<Arc<MediaStream>> {
        self.video.clone()
    }

    /// Acquire the streams the initial state asks for.
    ///
    /// Acquisition failures are degradable: the failed device is marked off
    /// and returned for reporting, the rest stay as acquired.
    pub async fn acquire_initial(&mut self) -> Vec<DeviceError> {
        let wanted = self.state();
        let mut failures = Vec::new();

        if wanted.mic_enabled {
            if let Err(e) = self.acquire(TrackKind::Audio).await {
                self.state_tx.send_modify(|s| s.mic_enabled = false);
                failures.push(e);
            }
        }
        if wanted.camera_enabled {
            if let Err(e) = self.acquire(TrackKind::Video).await {
                self.state_tx.send_modify(|s| s.camera_enabled = false);
                failures.push(e);
            }
        }

        failures
    }

    /// Turn the microphone on or off.
    pub async fn set_mic(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.set_track(TrackKind::Audio, enabled).await
    }

    /// Turn the camera on or off.
    pub async fn set_camera(&mut self, enabled: bool) -> Result<(), DeviceError> {
        self.set_track(TrackKind::Video, enabled).await
    }

    async fn set_track(&mut self, kind: TrackKind, enabled: bool) -> Result<(), DeviceError> {
        if enabled {
            // Acquisition failure leaves the previous state in effect.
            self.acquire(kind).await?;
        } else if let Some(stream) = self.slot(kind) {
            stream.set_enabled(false);
        }

        self.state_tx.send_modify(|s| match kind {
            TrackKind::Audio => s.mic_enabled = enabled,
            TrackKind::Video => s.camera_enabled = enabled,
        });
        Ok(())
    }

    async fn acquire(&mut self, kind: TrackKind) -> Result<(), DeviceError> {
        if let Some(stream) = self.slot(kind) {
            stream.set_enabled(true);
            return Ok(());
        }

        let stream = self.source.open(kind).await?;
        info!(
            "Acquired {:?} stream from {} source",
            kind,
            self.source.name()
        );
        match kind {
            TrackKind::Audio => self.audio = Some(stream),
            TrackKind::Video => self.video = Some(stream),
        }
        Ok(())
    }

    fn slot(&self, kind: TrackKind) -> Option<&Arc<MediaStream>> {
        match kind {
            TrackKind::Audio => self.audio.as_ref(),
            TrackKind::Video => self.video.as_ref(),
        }
    }
}
