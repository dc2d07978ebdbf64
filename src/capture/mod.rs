//! Capture-record pipeline
//!
//! Records a live media stream into fragments and uploads finished clips
//! to the translation backend:
//! - `CapturePipeline`: the Idle/Recording/Flushing cycle state machine
//! - `Uploader` / `HttpUploader`: multipart clip upload and photo echo
//! - `PeriodicSnapshot`: the cancellable still-frame echo loop

mod pipeline;
mod snapshot;
mod uploader;

pub use pipeline::{CaptureError, CapturePipeline, CaptureState};
pub use snapshot::PeriodicSnapshot;
pub use uploader::{HttpUploader, UploadError, Uploader};
