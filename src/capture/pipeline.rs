use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::uploader::Uploader;
use crate::media::{MediaFragment, MediaStream};

/// Capture cycle state.
///
/// The terminal state is always `Idle`; failures report and return to
/// `Idle`, there is no error state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureState {
    Idle,
    Recording,
    Flushing,
}

/// Capture state machine misuse.
///
/// The driving UI should disable the triggering control, but the pipeline
/// fails these safely when reached.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("a capture cycle is already recording")]
    AlreadyRecording,
    #[error("no capture cycle is recording")]
    NotRecording,
    #[error("no active media stream to record")]
    NoActiveStream,
}

/// One record-then-upload cycle in flight.
struct CaptureCycle {
    id: Uuid,
    fragments: Arc<Mutex<Vec<MediaFragment>>>,
    stop_tx: watch::Sender<bool>,
    appender: JoinHandle<()>,
}

/// Records a live media stream into fragments and uploads finished clips.
///
/// State machine: `Idle -> Recording -> Flushing -> Idle`. Exactly one
/// cycle may be recording at a time; upload cycles are independent of each
/// other and of subsequent recordings.
pub struct CapturePipeline {
    uploader: Arc<dyn Uploader>,
    state: CaptureState,
    current: Option<CaptureCycle>,
    last_started_at: Option<DateTime<Utc>>,
}

impl CapturePipeline {
    pub fn new(uploader: Arc<dyn Uploader>) -> Self {
        Self {
            uploader,
            state: CaptureState::Idle,
            current: None,
            last_started_at: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Start timestamp of the current or most recent cycle. Increases
    /// across cycles.
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.last_started_at
    }

    /// Begin a new capture cycle on the given live stream.
    ///
    /// Fragments are appended as the stream produces them; boundaries are
    /// whatever the producing backend emits.
    pub fn start_capture(&mut self, stream: Option<&Arc<MediaStream>>) -> Result<(), CaptureError> {
        if self.state != CaptureState::Idle {
            return Err(CaptureError::AlreadyRecording);
        }
        let stream = match stream {
            Some(s) if s.is_enabled() => s,
            _ => return Err(CaptureError::NoActiveStream),
        };

        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let fragments = Arc::new(Mutex::new(Vec::new()));
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let mut frames = stream.subscribe();
        let sink = Arc::clone(&fragments);

        let appender = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    frame = frames.recv() => match frame {
                        Ok(fragment) => {
                            if fragment.data.is_empty() {
                                continue;
                            }
                            sink.lock().await.push(fragment);
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("Capture fell behind live stream, skipped {} fragments", skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
            // Drain fragments already buffered when the stop arrived.
            loop {
                match frames.try_recv() {
                    Ok(fragment) => {
                        if fragment.data.is_empty() {
                            continue;
                        }
                        sink.lock().await.push(fragment);
                    }
                    Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                        warn!("Capture fell behind live stream, skipped {} fragments", skipped);
                    }
                    Err(_) => break,
                }
            }
        });

        info!("Capture cycle {} recording", id);
        self.current = Some(CaptureCycle {
            id,
            fragments,
            stop_tx,
            appender,
        });
        self.last_started_at = Some(started_at);
        self.state = CaptureState::Recording;
        Ok(())
    }

    /// Finish the current cycle: drain the recorded fragments, concatenate
    /// them into one clip, and issue the upload.
    ///
    /// The upload runs detached: its outcome is logged, never retried, and
    /// never gates the next `start_capture`.
    pub async fn stop_capture(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Recording {
            return Err(CaptureError::NotRecording);
        }
        let cycle = self.current.take().ok_or(CaptureError::NotRecording)?;

        self.state = CaptureState::Flushing;
        let _ = cycle.stop_tx.send(true);
        if let Err(e) = cycle.appender.await {
            error!("Capture appender task panicked: {}", e);
        }

        let fragments = {
            let mut fragments = cycle.fragments.lock().await;
            std::mem::take(&mut *fragments)
        };
        let clip: Vec<u8> = fragments.into_iter().flat_map(|f| f.data).collect();

        if clip.is_empty() {
            warn!("Capture cycle {} produced no data, skipping upload", cycle.id);
        } else {
            info!("Capture cycle {} flushed {} bytes, uploading", cycle.id, clip.len());
            let uploader = Arc::clone(&self.uploader);
            let cycle_id = cycle.id;
            tokio::spawn(async move {
                match uploader.upload_clip(clip).await {
                    Ok(()) => info!("Clip {} uploaded", cycle_id),
                    Err(e) => error!("Clip {} upload failed: {}", cycle_id, e),
                }
            });
        }

        self.state = CaptureState::Idle;
        Ok(())
    }

    /// Discard an in-progress cycle without uploading anything.
    pub async fn abandon(&mut self) {
        let Some(cycle) = self.current.take() else {
            self.state = CaptureState::Idle;
            return;
        };

        let _ = cycle.stop_tx.send(true);
        cycle.appender.abort();
        info!("Capture cycle {} abandoned", cycle.id);
        self.state = CaptureState::Idle;
    }
}
