//! Conferencing transport seam
//!
//! The realtime audio/video transport is an external collaborator; this
//! module defines the client trait the orchestrator drives and an
//! in-process loopback implementation for development and tests.

mod client;
mod loopback;

pub use client::{
    ConferencingBackend, ConferencingClient, ConferencingFactory, RemoteParticipant, RosterEvent,
};
pub use loopback::LoopbackConferencing;
