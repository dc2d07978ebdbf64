use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use anyhow::{bail, Result};
use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::info;

use super::client::{ConferencingClient, RemoteParticipant, RosterEvent};
use crate::media::{MediaStream, TrackKind};

/// In-process conferencing client for development and tests.
///
/// Joins are local state changes; published tracks and the remote roster
/// are visible to a driving harness, which can inject remote participants.
pub struct LoopbackConferencing {
    joined: RwLock<Option<String>>,
    published: RwLock<HashMap<TrackKind, Arc<MediaStream>>>,
    remotes: RwLock<Vec<RemoteParticipant>>,
    roster_tx: broadcast::Sender<RosterEvent>,
    joins_issued: AtomicUsize,
}

impl LoopbackConferencing {
    pub fn new() -> Arc<Self> {
        let (roster_tx, _) = broadcast::channel(16);
        Arc::new(Self {
            joined: RwLock::new(None),
            published: RwLock::new(HashMap::new()),
            remotes: RwLock::new(Vec::new()),
            roster_tx,
            joins_issued: AtomicUsize::new(0),
        })
    }

    /// Channel currently joined, if any.
    pub fn joined_channel(&self) -> Option<String> {
        self.joined.read().unwrap().clone()
    }

    /// Number of join calls accepted over the client's lifetime.
    pub fn joins_issued(&self) -> usize {
        self.joins_issued.load(Ordering::SeqCst)
    }

    /// Kinds currently published.
    pub fn published_kinds(&self) -> Vec<TrackKind> {
        self.published.read().unwrap().keys().copied().collect()
    }

    /// The live stream published for a kind, if any.
    pub fn published_stream(&self, kind: TrackKind) -> Option<Arc<MediaStream>> {
        self.published.read().unwrap().get(&kind).cloned()
    }

    /// Simulate a remote participant joining.
    pub fn remote_joined(&self, uid: u64) {
        let participant = RemoteParticipant { uid };
        self.remotes.write().unwrap().push(participant);
        let _ = self.roster_tx.send(RosterEvent::Joined(participant));
    }

    /// Simulate a remote participant leaving.
    pub fn remote_left(&self, uid: u64) {
        self.remotes.write().unwrap().retain(|p| p.uid != uid);
        let _ = self
            .roster_tx
            .send(RosterEvent::Left(RemoteParticipant { uid }));
    }
}

#[async_trait]
impl ConferencingClient for LoopbackConferencing {
    async fn join(&self, app_id: &str, channel: &str, token: Option<&str>) -> Result<()> {
        if token.is_some() {
            bail!("loopback conferencing has no token support");
        }
        let mut joined = self.joined.write().unwrap();
        if joined.is_some() {
            bail!("already joined a channel");
        }
        *joined = Some(channel.to_string());
        self.joins_issued.fetch_add(1, Ordering::SeqCst);
        info!("Loopback join: app={} channel={}", app_id, channel);
        Ok(())
    }

    async fn leave(&self) -> Result<()> {
        if let Some(channel) = self.joined.write().unwrap().take() {
            info!("Loopback leave: channel={}", channel);
        }
        self.published.write().unwrap().clear();
        Ok(())
    }

    async fn publish(&self, track: Arc<MediaStream>) -> Result<()> {
        if self.joined.read().unwrap().is_none() {
            bail!("cannot publish before joining a channel");
        }
        info!("Loopback publish: {:?}", track.kind());
        self.published.write().unwrap().insert(track.kind(), track);
        Ok(())
    }

    async fn unpublish(&self, kind: TrackKind) -> Result<()> {
        self.published.write().unwrap().remove(&kind);
        info!("Loopback unpublish: {:?}", kind);
        Ok(())
    }

    fn remotes(&self) -> Vec<RemoteParticipant> {
        self.remotes.read().unwrap().clone()
    }

    fn roster(&self) -> broadcast::Receiver<RosterEvent> {
        self.roster_tx.subscribe()
    }

    fn name(&self) -> &str {
        "loopback"
    }
}
