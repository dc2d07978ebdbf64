// End-to-end orchestration scenarios
//
// These tests drive a full CallSession against the loopback conferencing
// client, a synthetic media source, and a recording uploader double.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{wait_for, DenyingSource, RecordingUploader, RefusingConferencing};
use futures::SinkExt;
use signcall::{
    CallSession, CaptureError, CaptureState, JoinState, Layout, LoopbackConferencing, Role,
    SessionConfig, SessionError, SyntheticSource, TrackKind,
};
use tokio_tungstenite::tungstenite::protocol::Message;

fn session_config(channel: &str, role: Role) -> SessionConfig {
    SessionConfig {
        channel: channel.to_string(),
        role,
        debounce_window: Duration::from_millis(50),
        ..SessionConfig::default()
    }
}

fn synthetic_source() -> Arc<SyntheticSource> {
    Arc::new(SyntheticSource {
        frame_interval: Duration::from_millis(10),
        frame_bytes: 256,
    })
}

#[tokio::test]
async fn test_primary_capture_cycle_uploads_once() {
    let conferencing = LoopbackConferencing::new();
    let uploader = RecordingUploader::new();

    let session = CallSession::join(
        session_config("room1", Role::Primary),
        conferencing.clone(),
        synthetic_source(),
        uploader.clone(),
    )
    .await
    .unwrap();

    assert_eq!(session.join_state(), JoinState::Joined);
    assert_eq!(conferencing.joined_channel().as_deref(), Some("room1"));
    let device = session.device_state().await;
    assert!(device.mic_enabled);
    assert!(device.camera_enabled);

    // Toggle the camera off and on; the session stays joined throughout.
    session.set_camera(false).await.unwrap();
    assert!(!session.device_state().await.camera_enabled);
    assert_eq!(session.join_state(), JoinState::Joined);
    session.set_camera(true).await.unwrap();
    assert!(session.device_state().await.camera_enabled);
    assert_eq!(
        conferencing.joins_issued(),
        1,
        "Toggles must not rejoin the channel"
    );

    // One capture cycle over the live camera stream.
    session.start_capture().await.unwrap();
    assert_eq!(session.capture_state().await, CaptureState::Recording);
    tokio::time::sleep(Duration::from_millis(120)).await;
    session.stop_capture().await.unwrap();
    assert_eq!(session.capture_state().await, CaptureState::Idle);

    assert!(
        wait_for(|| uploader.attempts() == 1, Duration::from_secs(2)).await,
        "Exactly one upload should be issued"
    );
    let clips = uploader.clips();
    assert_eq!(clips.len(), 1);
    assert!(!clips[0].is_empty(), "The uploaded clip must not be empty");

    session.end().await;
    assert_eq!(session.join_state(), JoinState::Left);
    assert!(conferencing.joined_channel().is_none());
}

#[tokio::test]
async fn test_device_toggles_last_write_wins() {
    let conferencing = LoopbackConferencing::new();
    let session = CallSession::join(
        session_config("room-toggles", Role::Primary),
        conferencing.clone(),
        synthetic_source(),
        RecordingUploader::new(),
    )
    .await
    .unwrap();

    session.set_mic(false).await.unwrap();
    session.set_camera(false).await.unwrap();
    session.set_mic(true).await.unwrap();
    session.set_camera(false).await.unwrap();
    session.set_camera(true).await.unwrap();
    session.set_mic(false).await.unwrap();

    let device = session.device_state().await;
    assert!(!device.mic_enabled, "Last mic write was off");
    assert!(device.camera_enabled, "Last camera write was on");
    assert_eq!(session.join_state(), JoinState::Joined);

    // Publication follows the final state.
    assert_eq!(conferencing.published_kinds(), vec![TrackKind::Video]);

    session.end().await;
}

#[tokio::test]
async fn test_secondary_receives_translation_and_shows_overlay() {
    // In-process translation backend.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
        ws.send(Message::Text("sign this".to_string()))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let conferencing = LoopbackConferencing::new();
    let mut config = session_config("room2", Role::Secondary);
    config.realtime_url = Some(format!("ws://{}", addr));

    let session = CallSession::join(
        config,
        conferencing.clone(),
        synthetic_source(),
        RecordingUploader::new(),
    )
    .await
    .unwrap();

    // The secondary participant joins with the microphone off.
    let device = session.device_state().await;
    assert!(!device.mic_enabled);
    assert!(device.camera_enabled);
    assert_eq!(conferencing.published_kinds(), vec![TrackKind::Video]);

    // The pushed translation becomes the debounced render query.
    let probe = Arc::clone(&session);
    assert!(
        wait_for(
            move || {
                probe
                    .render_query()
                    .map(|q| q.as_str() == "sign%20this")
                    .unwrap_or(false)
            },
            Duration::from_secs(2),
        )
        .await,
        "The translation should surface as an encoded render query"
    );

    assert!(session.overlay_visible());
    let url = session.avatar_url().unwrap();
    assert!(url.contains("text=sign%20this&spoken=en&signed=ase"));

    session.end().await;
}

#[tokio::test]
async fn test_primary_never_shows_overlay() {
    let session = CallSession::join(
        session_config("room3", Role::Primary),
        LoopbackConferencing::new(),
        synthetic_source(),
        RecordingUploader::new(),
    )
    .await
    .unwrap();

    // Typed input reaches the same debounced flow.
    session.submit_text("sign this");
    let probe = Arc::clone(&session);
    assert!(
        wait_for(
            move || probe.render_query().is_some(),
            Duration::from_secs(2)
        )
        .await
    );

    assert!(
        !session.overlay_visible(),
        "The overlay is a secondary-role affordance"
    );

    session.end().await;
}

#[tokio::test]
async fn test_layout_follows_remote_count() {
    let conferencing = LoopbackConferencing::new();
    let session = CallSession::join(
        session_config("room4", Role::Primary),
        conferencing.clone(),
        synthetic_source(),
        RecordingUploader::new(),
    )
    .await
    .unwrap();

    assert_eq!(session.layout(), Layout::FullSurface);

    conferencing.remote_joined(7);
    assert_eq!(session.layout(), Layout::PictureInPicture);

    conferencing.remote_joined(8);
    assert_eq!(session.layout(), Layout::FullSurface);

    conferencing.remote_left(8);
    assert_eq!(session.layout(), Layout::PictureInPicture);

    session.end().await;
}

#[tokio::test]
async fn test_channel_join_rejection_is_fatal() {
    let result = CallSession::join(
        session_config("room5", Role::Primary),
        RefusingConferencing::new(),
        synthetic_source(),
        RecordingUploader::new(),
    )
    .await;

    assert!(matches!(
        result,
        Err(SessionError::ChannelJoinFailed { .. })
    ));
}

#[tokio::test]
async fn test_device_unavailable_degrades_session() {
    let conferencing = LoopbackConferencing::new();
    let session = CallSession::join(
        session_config("room6", Role::Primary),
        conferencing.clone(),
        Arc::new(DenyingSource),
        RecordingUploader::new(),
    )
    .await
    .unwrap();

    // The join survives; both devices report off.
    let device = session.device_state().await;
    assert!(!device.mic_enabled);
    assert!(!device.camera_enabled);
    assert_eq!(session.join_state(), JoinState::Joined);

    // Retrying the toggle reports the failure and keeps the previous state.
    assert!(session.set_camera(true).await.is_err());
    assert!(!session.device_state().await.camera_enabled);

    // With no live stream, capture refuses to start.
    assert_eq!(
        session.start_capture().await.unwrap_err(),
        CaptureError::NoActiveStream
    );

    session.end().await;
}

#[tokio::test]
async fn test_end_call_abandons_capture() {
    let uploader = RecordingUploader::new();
    let session = CallSession::join(
        session_config("room7", Role::Primary),
        LoopbackConferencing::new(),
        synthetic_source(),
        uploader.clone(),
    )
    .await
    .unwrap();

    session.start_capture().await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    session.end().await;

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(
        uploader.attempts(),
        0,
        "An in-progress cycle is discarded without uploading"
    );
    assert_eq!(session.capture_state().await, CaptureState::Idle);
}
