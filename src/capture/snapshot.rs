use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::uploader::Uploader;
use crate::media::{MediaFragment, MediaStream};

/// Periodic still-frame echo loop, the single-frame variant of the clip
/// uploader.
///
/// Every tick the most recent fragment of the stream is posted to the
/// photo-echo endpoint and the decoded response image is published
/// latest-wins. The task is bound to this handle: dropping it cancels the
/// loop exactly once.
pub struct PeriodicSnapshot {
    task: JoinHandle<()>,
    echoes: watch::Receiver<Option<Vec<u8>>>,
}

impl PeriodicSnapshot {
    pub fn start(
        stream: Arc<MediaStream>,
        uploader: Arc<dyn Uploader>,
        period: Duration,
    ) -> Self {
        let (echo_tx, echoes) = watch::channel(None);
        let mut frames = stream.subscribe();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;

                let Some(frame) = latest_fragment(&mut frames) else {
                    debug!("No fresh frame for snapshot tick");
                    continue;
                };
                match uploader.echo_photo(frame).await {
                    Ok(image) => {
                        let _ = echo_tx.send(Some(image));
                    }
                    Err(e) => warn!("Photo echo failed: {}", e),
                }
            }
        });

        Self { task, echoes }
    }

    /// Latest echoed image, if any tick has succeeded yet.
    pub fn echoes(&self) -> watch::Receiver<Option<Vec<u8>>> {
        self.echoes.clone()
    }
}

impl Drop for PeriodicSnapshot {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Drain the tap down to the newest pending fragment.
fn latest_fragment(rx: &mut broadcast::Receiver<MediaFragment>) -> Option<Vec<u8>> {
    let mut latest = None;
    loop {
        match rx.try_recv() {
            Ok(fragment) => latest = Some(fragment.data),
            Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    latest
}
