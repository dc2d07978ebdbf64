// Integration tests for the capture-record pipeline
//
// These tests verify the Idle -> Recording -> Flushing -> Idle state
// machine, fragment collection, and the fire-and-forget upload semantics.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{wait_for, RecordingUploader};
use signcall::{
    CaptureError, CapturePipeline, CaptureState, MediaFragment, MediaStream, PeriodicSnapshot,
    TrackKind,
};

fn fragment(data: &[u8], timestamp_ms: u64) -> MediaFragment {
    MediaFragment {
        data: data.to_vec(),
        timestamp_ms,
    }
}

#[tokio::test]
async fn test_start_requires_active_stream() {
    let uploader = RecordingUploader::new();
    let mut pipeline = CapturePipeline::new(uploader);

    let err = pipeline.start_capture(None).unwrap_err();
    assert_eq!(err, CaptureError::NoActiveStream);
    assert_eq!(pipeline.state(), CaptureState::Idle);

    // A disabled stream is not an active stream either.
    let stream = MediaStream::new(TrackKind::Video);
    stream.set_enabled(false);
    let err = pipeline.start_capture(Some(&stream)).unwrap_err();
    assert_eq!(err, CaptureError::NoActiveStream);
    assert_eq!(pipeline.state(), CaptureState::Idle);
}

#[tokio::test]
async fn test_start_twice_reports_already_recording() {
    let uploader = RecordingUploader::new();
    let mut pipeline = CapturePipeline::new(uploader);
    let stream = MediaStream::new(TrackKind::Video);

    pipeline.start_capture(Some(&stream)).unwrap();
    let err = pipeline.start_capture(Some(&stream)).unwrap_err();
    assert_eq!(err, CaptureError::AlreadyRecording);
    assert_eq!(pipeline.state(), CaptureState::Recording);
}

#[tokio::test]
async fn test_stop_without_start_reports_not_recording() {
    let uploader = RecordingUploader::new();
    let mut pipeline = CapturePipeline::new(uploader);

    let err = pipeline.stop_capture().await.unwrap_err();
    assert_eq!(err, CaptureError::NotRecording);
    assert_eq!(pipeline.state(), CaptureState::Idle);
}

#[tokio::test]
async fn test_cycle_records_and_uploads_once() {
    let uploader = RecordingUploader::new();
    let mut pipeline = CapturePipeline::new(uploader.clone());
    let stream = MediaStream::new(TrackKind::Video);

    pipeline.start_capture(Some(&stream)).unwrap();

    // Fragments append in order; empty ones are discarded.
    stream.push(fragment(b"abc", 0));
    stream.push(fragment(b"", 50));
    stream.push(fragment(b"def", 100));

    pipeline.stop_capture().await.unwrap();
    assert_eq!(pipeline.state(), CaptureState::Idle);

    assert!(
        wait_for(|| uploader.attempts() == 1, Duration::from_secs(2)).await,
        "Exactly one upload should be issued"
    );
    let clips = uploader.clips();
    assert_eq!(clips.len(), 1);
    assert_eq!(clips[0], b"abcdef".to_vec());
}

#[tokio::test]
async fn test_failed_upload_does_not_block_next_cycle() {
    let uploader = RecordingUploader::new();
    uploader.set_fail(true);
    let mut pipeline = CapturePipeline::new(uploader.clone());
    let stream = MediaStream::new(TrackKind::Video);

    // Three back-to-back cycles, every upload failing.
    for i in 0..3u8 {
        pipeline.start_capture(Some(&stream)).unwrap();
        stream.push(fragment(&[i; 8], u64::from(i) * 100));
        pipeline.stop_capture().await.unwrap();
        assert_eq!(pipeline.state(), CaptureState::Idle);
    }

    assert!(
        wait_for(|| uploader.attempts() == 3, Duration::from_secs(2)).await,
        "All attempts must be issued independently"
    );
    assert!(uploader.clips().is_empty());
}

#[tokio::test]
async fn test_empty_cycle_skips_upload() {
    let uploader = RecordingUploader::new();
    let mut pipeline = CapturePipeline::new(uploader.clone());
    let stream = MediaStream::new(TrackKind::Video);

    pipeline.start_capture(Some(&stream)).unwrap();
    pipeline.stop_capture().await.unwrap();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(uploader.attempts(), 0, "Nothing to upload for an empty clip");
    assert_eq!(pipeline.state(), CaptureState::Idle);
}

#[tokio::test]
async fn test_abandon_discards_without_upload() {
    let uploader = RecordingUploader::new();
    let mut pipeline = CapturePipeline::new(uploader.clone());
    let stream = MediaStream::new(TrackKind::Video);

    pipeline.start_capture(Some(&stream)).unwrap();
    stream.push(fragment(b"doomed", 0));
    pipeline.abandon().await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(uploader.attempts(), 0);
    assert_eq!(pipeline.state(), CaptureState::Idle);

    // A fresh cycle still works afterwards.
    pipeline.start_capture(Some(&stream)).unwrap();
    stream.push(fragment(b"kept", 0));
    pipeline.stop_capture().await.unwrap();
    assert!(wait_for(|| uploader.attempts() == 1, Duration::from_secs(2)).await);
    assert_eq!(uploader.clips(), vec![b"kept".to_vec()]);
}

#[tokio::test]
async fn test_cycle_start_timestamps_increase() {
    let uploader = RecordingUploader::new();
    let mut pipeline = CapturePipeline::new(uploader);
    let stream = MediaStream::new(TrackKind::Video);

    pipeline.start_capture(Some(&stream)).unwrap();
    let first = pipeline.started_at().unwrap();
    pipeline.stop_capture().await.unwrap();

    pipeline.start_capture(Some(&stream)).unwrap();
    let second = pipeline.started_at().unwrap();
    pipeline.stop_capture().await.unwrap();

    assert!(second >= first);
}

#[tokio::test]
async fn test_periodic_snapshot_echoes_latest_frame() {
    let uploader = RecordingUploader::new();
    let stream = MediaStream::new(TrackKind::Video);
    let snapshot = PeriodicSnapshot::start(
        Arc::clone(&stream),
        uploader.clone(),
        Duration::from_millis(20),
    );
    let echoes = snapshot.echoes();

    stream.push(fragment(b"frame-1", 0));
    stream.push(fragment(b"frame-2", 10));

    // A tick picks up the newest pending frame; the double echoes it back.
    assert!(
        wait_for(
            || echoes.borrow().as_deref() == Some(b"frame-2".as_ref()),
            Duration::from_secs(2),
        )
        .await,
        "The newest frame should be echoed"
    );

    // Dropping the handle cancels the loop; no further ticks fire.
    drop(snapshot);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let attempts = uploader.attempts();
    stream.push(fragment(b"frame-3", 20));
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(uploader.attempts(), attempts);
}
