use std::sync::Arc;

use tokio::sync::RwLock;

use crate::capture::Uploader;
use crate::conferencing::ConferencingClient;
use crate::config::Config;
use crate::media::MediaSource;
use crate::session::CallSession;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub conferencing: Arc<dyn ConferencingClient>,
    pub media_source: Arc<dyn MediaSource>,
    pub uploader: Arc<dyn Uploader>,

    /// The active call, if any. One call per client.
    pub call: Arc<RwLock<Option<Arc<CallSession>>>>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        conferencing: Arc<dyn ConferencingClient>,
        media_source: Arc<dyn MediaSource>,
        uploader: Arc<dyn Uploader>,
    ) -> Self {
        Self {
            config,
            conferencing,
            media_source,
            uploader,
            call: Arc::new(RwLock::new(None)),
        }
    }
}
