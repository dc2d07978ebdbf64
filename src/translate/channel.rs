use chrono::{DateTime, Utc};
use futures::StreamExt;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, protocol::Message};
use tracing::{info, warn};

/// Per-session client identity for the realtime channel.
///
/// Derived from the current time for uniqueness, but always passed
/// explicitly so tests can supply deterministic ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(String);

impl ClientId {
    pub fn now() -> Self {
        Self::from_timestamp(Utc::now())
    }

    pub fn from_timestamp(at: DateTime<Utc>) -> Self {
        Self(at.timestamp_millis().to_string())
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One translated-text push from the backend.
///
/// Only the most recent message matters; the render target reflects the
/// current utterance, not history.
#[derive(Debug, Clone)]
pub struct TranslationMessage {
    pub text: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to open realtime channel at {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: tungstenite::Error,
    },
}

/// Persistent duplex connection delivering translated text pushes.
///
/// Opened once per session; messages are retained latest-wins. There is no
/// automatic reconnect: a dropped socket ends delivery for the session.
pub struct TranslationChannel {
    latest: watch::Receiver<Option<TranslationMessage>>,
    reader: JoinHandle<()>,
}

impl TranslationChannel {
    /// Connect to `<endpoint>/video-call/<client_id>`.
    pub async fn connect(endpoint: &str, client_id: &ClientId) -> Result<Self, ChannelError> {
        let url = format!("{}/video-call/{}", endpoint.trim_end_matches('/'), client_id);

        let (mut socket, _) =
            connect_async(url.as_str())
                .await
                .map_err(|source| ChannelError::Connect {
                    url: url.clone(),
                    source,
                })?;
        info!("Realtime channel open at {}", url);

        let (latest_tx, latest) = watch::channel(None);
        let reader = tokio::spawn(async move {
            while let Some(message) = socket.next().await {
                match message {
                    // Payloads are opaque text; no schema validation here.
                    Ok(Message::Text(text)) => {
                        latest_tx.send_replace(Some(TranslationMessage {
                            text,
                            received_at: Utc::now(),
                        }));
                    }
                    Ok(Message::Close(_)) => {
                        info!("Realtime channel closed by server");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Realtime channel error: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self { latest, reader })
    }

    /// Latest-wins view of the received messages.
    pub fn messages(&self) -> watch::Receiver<Option<TranslationMessage>> {
        self.latest.clone()
    }

    /// Tear the connection down. Undelivered messages are dropped.
    pub fn close(self) {}
}

impl Drop for TranslationChannel {
    fn drop(&mut self) {
        self.reader.abort();
    }
}
