use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::media::{MediaStream, TrackKind};

/// A remote participant currently in the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteParticipant {
    pub uid: u64,
}

/// Roster change notification.
#[derive(Debug, Clone, Copy)]
pub enum RosterEvent {
    Joined(RemoteParticipant),
    Left(RemoteParticipant),
}

/// Realtime conferencing transport seam.
///
/// The protocol internals live in the vendor SDK; this core only drives
/// join/leave, track publication, and the remote roster. The token stays
/// `None` in this design (open trust model).
#[async_trait]
pub trait ConferencingClient: Send + Sync {
    /// Join a channel. Rejection is fatal to the session.
    async fn join(&self, app_id: &str, channel: &str, token: Option<&str>) -> Result<()>;

    /// Leave the channel.
    async fn leave(&self) -> Result<()>;

    /// Publish a local track. The published stream is the same live
    /// instance the capture pipeline taps.
    async fn publish(&self, track: Arc<MediaStream>) -> Result<()>;

    /// Withdraw a published track without leaving the channel.
    async fn unpublish(&self, kind: TrackKind) -> Result<()>;

    /// Current remote roster snapshot.
    fn remotes(&self) -> Vec<RemoteParticipant>;

    /// Subscribe to roster add/remove notifications.
    fn roster(&self) -> broadcast::Receiver<RosterEvent>;

    /// Client name for logging.
    fn name(&self) -> &str;
}

/// Conferencing backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConferencingBackend {
    /// In-process client (development, tests).
    Loopback,
    /// Vendor conferencing SDK.
    Vendor,
}

/// Conferencing client factory.
pub struct ConferencingFactory;

impl ConferencingFactory {
    pub fn create(backend: ConferencingBackend) -> Result<Arc<dyn ConferencingClient>> {
        match backend {
            ConferencingBackend::Loopback => Ok(super::loopback::LoopbackConferencing::new()),
            ConferencingBackend::Vendor => {
                bail!("vendor conferencing SDK is not linked into this build")
            }
        }
    }
}
