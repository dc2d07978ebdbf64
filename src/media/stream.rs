use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Kind of local media track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// One encoded media fragment from a live stream.
///
/// Fragment boundaries are chosen by the producing backend; consumers treat
/// the bytes as opaque.
#[derive(Debug, Clone)]
pub struct MediaFragment {
    /// Encoded media bytes.
    pub data: Vec<u8>,
    /// Milliseconds since the stream was opened.
    pub timestamp_ms: u64,
}

/// Hardware acquisition failure. Recoverable: the previous device state
/// stays in effect and the user may retry the toggle.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("{kind:?} device unavailable: {reason}")]
    Unavailable { kind: TrackKind, reason: String },
}

/// A live local media stream.
///
/// Exactly one instance exists per acquired device. The conferencing
/// publisher and the capture pipeline share it through `Arc`, so flipping
/// the enabled flag is visible to every holder at once.
pub struct MediaStream {
    kind: TrackKind,
    enabled: AtomicBool,
    frames: broadcast::Sender<MediaFragment>,
}

impl MediaStream {
    pub fn new(kind: TrackKind) -> Arc<Self> {
        let (frames, _) = broadcast::channel(64);
        Arc::new(Self {
            kind,
            enabled: AtomicBool::new(true),
            frames,
        })
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        debug!(
            "{:?} stream {}",
            self.kind,
            if enabled { "enabled" } else { "disabled" }
        );
    }

    /// Tap the live feed. Only fragments produced after the call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<MediaFragment> {
        self.frames.subscribe()
    }

    /// Feed one fragment from the producing backend.
    ///
    /// Fragments are dropped while the stream is disabled or nobody is
    /// listening.
    pub fn push(&self, fragment: MediaFragment) {
        if !self.is_enabled() {
            return;
        }
        let _ = self.frames.send(fragment);
    }
}

/// Local media acquisition backend.
///
/// Implementations own the hardware; everything downstream only ever holds
/// the `MediaStream` they hand out.
#[async_trait]
pub trait MediaSource: Send + Sync {
    /// Acquire a live stream for the given device. May fail when the
    /// hardware is missing, busy, or permission is denied.
    async fn open(&self, kind: TrackKind) -> Result<Arc<MediaStream>, DeviceError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// Synthetic fragment generator for development and tests.
///
/// Produces fixed-size fragments on a timer. The producer task holds only a
/// `Weak` reference to the stream, so it stops as soon as the last holder
/// is gone.
pub struct SyntheticSource {
    pub frame_interval: Duration,
    pub frame_bytes: usize,
}

impl Default for SyntheticSource {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(100),
            frame_bytes: 4096,
        }
    }
}

#[async_trait]
impl MediaSource for SyntheticSource {
    async fn open(&self, kind: TrackKind) -> Result<Arc<MediaStream>, DeviceError> {
        let stream = MediaStream::new(kind);
        let weak = Arc::downgrade(&stream);
        let frame_interval = self.frame_interval;
        let frame_bytes = self.frame_bytes;

        tokio::spawn(async move {
            let started = std::time::Instant::now();
            let mut ticker = tokio::time::interval(frame_interval);
            let mut seq: u8 = 0;
            loop {
                ticker.tick().await;
                let Some(stream) = weak.upgrade() else { break };
                stream.push(MediaFragment {
                    data: vec![seq; frame_bytes],
                    timestamp_ms: started.elapsed().as_millis() as u64,
                });
                seq = seq.wrapping_add(1);
            }
            debug!("Synthetic {:?} producer stopped", kind);
        });

        info!("Opened synthetic {:?} stream", kind);
        Ok(stream)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Media source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSourceKind {
    /// Timer-driven generator (development, tests).
    Synthetic,
    /// Real camera/microphone capture.
    Hardware,
}

/// Media source factory.
pub struct MediaSourceFactory;

impl MediaSourceFactory {
    pub fn create(
        kind: MediaSourceKind,
        frame_interval: Duration,
    ) -> anyhow::Result<Arc<dyn MediaSource>> {
        match kind {
            MediaSourceKind::Synthetic => Ok(Arc::new(SyntheticSource {
                frame_interval,
                ..SyntheticSource::default()
            })),
            MediaSourceKind::Hardware => {
                anyhow::bail!("hardware capture is not linked into this build")
            }
        }
    }
}
