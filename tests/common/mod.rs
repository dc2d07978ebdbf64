// Shared test doubles for the integration tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::broadcast;

use signcall::{
    ConferencingClient, DeviceError, MediaSource, MediaStream, RemoteParticipant, RosterEvent,
    TrackKind, UploadError, Uploader,
};

/// Uploader double that records clips instead of sending them.
pub struct RecordingUploader {
    clips: Mutex<Vec<Vec<u8>>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingUploader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            clips: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        })
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn clips(&self) -> Vec<Vec<u8>> {
        self.clips.lock().unwrap().clone()
    }
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn upload_clip(&self, clip: Vec<u8>) -> Result<(), UploadError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(UploadError::Response("simulated failure".to_string()));
        }
        self.clips.lock().unwrap().push(clip);
        Ok(())
    }

    async fn echo_photo(&self, frame: Vec<u8>) -> Result<Vec<u8>, UploadError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(UploadError::Response("simulated failure".to_string()));
        }
        self.clips.lock().unwrap().push(frame.clone());
        Ok(frame)
    }
}

/// Media source double that refuses every acquisition.
pub struct DenyingSource;

#[async_trait]
impl MediaSource for DenyingSource {
    async fn open(&self, kind: TrackKind) -> Result<Arc<MediaStream>, DeviceError> {
        Err(DeviceError::Unavailable {
            kind,
            reason: "denied by test".to_string(),
        })
    }

    fn name(&self) -> &str {
        "denying"
    }
}

/// Conferencing double that rejects every join.
pub struct RefusingConferencing {
    roster_tx: broadcast::Sender<RosterEvent>,
}

impl RefusingConferencing {
    pub fn new() -> Arc<Self> {
        let (roster_tx, _) = broadcast::channel(4);
        Arc::new(Self { roster_tx })
    }
}

#[async_trait]
impl ConferencingClient for RefusingConferencing {
    async fn join(&self, _app_id: &str, _channel: &str, _token: Option<&str>) -> Result<()> {
        bail!("channel rejected by server")
    }

    async fn leave(&self) -> Result<()> {
        Ok(())
    }

    async fn publish(&self, _track: Arc<MediaStream>) -> Result<()> {
        Ok(())
    }

    async fn unpublish(&self, _kind: TrackKind) -> Result<()> {
        Ok(())
    }

    fn remotes(&self) -> Vec<RemoteParticipant> {
        Vec::new()
    }

    fn roster(&self) -> broadcast::Receiver<RosterEvent> {
        self.roster_tx.subscribe()
    }

    fn name(&self) -> &str {
        "refusing"
    }
}

/// Poll a condition until it holds or the timeout elapses.
pub async fn wait_for<F: Fn() -> bool>(cond: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
