pub mod capture;
pub mod conferencing;
pub mod config;
pub mod http;
pub mod media;
pub mod session;
pub mod translate;

pub use capture::{
    CaptureError, CapturePipeline, CaptureState, HttpUploader, PeriodicSnapshot, UploadError,
    Uploader,
};
pub use conferencing::{
    ConferencingBackend, ConferencingClient, ConferencingFactory, LoopbackConferencing,
    RemoteParticipant, RosterEvent,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use media::{
    DeviceError, DeviceState, MediaFragment, MediaSource, MediaSourceFactory, MediaSourceKind,
    MediaStream, SyntheticSource, TrackController, TrackKind,
};
pub use session::{CallSession, CallStats, JoinState, Layout, Role, SessionConfig, SessionError};
pub use translate::{
    render_url, ChannelError, ClientId, QueryDebouncer, RenderQuery, TranslationChannel,
    TranslationMessage,
};
