//! Translated-text delivery
//!
//! The realtime duplex channel pushing translated text from the backend,
//! and the debounced render query derived from it (or from typed input).

mod channel;
mod debounce;

pub use channel::{ChannelError, ClientId, TranslationChannel, TranslationMessage};
pub use debounce::{render_url, QueryDebouncer, RenderQuery};
