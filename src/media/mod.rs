//! Local device acquisition and on/off state
//!
//! This module owns the hardware seam:
//! - `MediaStream`: one live, shared, toggleable stream of opaque fragments
//! - `MediaSource`: acquisition backend trait with a factory
//! - `TrackController`: the device state object every consumer reads

mod stream;
mod tracks;

pub use stream::{
    DeviceError, MediaFragment, MediaSource, MediaSourceFactory, MediaSourceKind, MediaStream,
    SyntheticSource, TrackKind,
};
pub use tracks::{DeviceState, TrackController};
