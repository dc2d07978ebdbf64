use std::time::Duration;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Characters the render service's query format leaves literal: ASCII
/// alphanumerics plus `- _ . ! ~ * ' ( )`. Everything else, spaces
/// included, is percent-encoded as UTF-8.
const RENDER_QUERY_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encoded text currently eligible for avatar rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderQuery(String);

impl RenderQuery {
    pub fn encode(raw: &str) -> Self {
        Self(utf8_percent_encode(raw, RENDER_QUERY_SET).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for RenderQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the avatar render widget URL. Declarative; nothing parses the
/// response.
pub fn render_url(base: &str, query: &RenderQuery, spoken: &str, signed: &str) -> String {
    format!(
        "{}?text={}&spoken={}&signed={}",
        base, query, spoken, signed
    )
}

/// Trailing-window debouncer from raw text to [`RenderQuery`].
///
/// Accepts a value on every keystroke or translation arrival; only the
/// last value observed within a quiet period is emitted. Emission is
/// monotonic (a single emitter task) and superseded values are discarded,
/// never queued. Dropping the debouncer mid-window drops the pending
/// emission.
pub struct QueryDebouncer {
    input: watch::Sender<String>,
    output: watch::Receiver<Option<RenderQuery>>,
    _emitter: JoinHandle<()>,
}

impl QueryDebouncer {
    pub fn new(window: Duration) -> Self {
        let (input, mut input_rx) = watch::channel(String::new());
        let (output_tx, output) = watch::channel(None);

        let emitter = tokio::spawn(async move {
            loop {
                if input_rx.changed().await.is_err() {
                    break;
                }
                // Restart the window on every arrival; emit the newest
                // value once it stays quiet.
                loop {
                    let window_timer = tokio::time::sleep(window);
                    tokio::pin!(window_timer);
                    tokio::select! {
                        _ = &mut window_timer => {
                            let raw = input_rx.borrow_and_update().clone();
                            let query = RenderQuery::encode(&raw);
                            debug!("Render query emitted: {}", query);
                            output_tx.send_replace(Some(query));
                            break;
                        }
                        changed = input_rx.changed() => {
                            if changed.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        });

        Self {
            input,
            output,
            _emitter: emitter,
        }
    }

    /// Feed one raw value (typed input or a translation arrival).
    pub fn submit(&self, raw: impl Into<String>) {
        self.input.send_replace(raw.into());
    }

    /// Subscribe to emitted queries (latest-wins).
    pub fn queries(&self) -> watch::Receiver<Option<RenderQuery>> {
        self.output.clone()
    }

    /// Most recently emitted query, if any.
    pub fn current(&self) -> Option<RenderQuery> {
        self.output.borrow().clone()
    }
}
