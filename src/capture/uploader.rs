use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Upload failure. Logged by callers, never retried: the clip has already
/// been superseded by the ongoing conversation.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upload rejected with status {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed upload response: {0}")]
    Response(String),
}

/// Transport for finished clips and still frames.
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Send a finished clip to the translation backend. The response body
    /// is ignored; only done/not-done matters to the caller.
    async fn upload_clip(&self, clip: Vec<u8>) -> Result<(), UploadError>;

    /// Send a single still frame and return the echoed, re-encoded image.
    async fn echo_photo(&self, frame: Vec<u8>) -> Result<Vec<u8>, UploadError>;
}

#[derive(Debug, Deserialize)]
struct PhotoEchoResponse {
    image_base64: String,
}

/// HTTP uploader against the translation backend.
pub struct HttpUploader {
    client: reqwest::Client,
    upload_url: String,
    photo_url: String,
}

impl HttpUploader {
    pub fn new(
        upload_url: impl Into<String>,
        photo_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            upload_url: upload_url.into(),
            photo_url: photo_url.into(),
        })
    }
}

#[async_trait]
impl Uploader for HttpUploader {
    async fn upload_clip(&self, clip: Vec<u8>) -> Result<(), UploadError> {
        let part = Part::bytes(clip)
            .file_name("recorded_video.webm")
            .mime_str("video/webm")?;
        let form = Form::new().part("video", part);

        debug!("Uploading clip to {}", self.upload_url);
        let response = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status));
        }
        Ok(())
    }

    async fn echo_photo(&self, frame: Vec<u8>) -> Result<Vec<u8>, UploadError> {
        let part = Part::bytes(frame)
            .file_name("photo.png")
            .mime_str("image/png")?;
        let form = Form::new().part("my_file", part);

        debug!("Posting still frame to {}", self.photo_url);
        let response = self
            .client
            .post(&self.photo_url)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status));
        }

        let echo: PhotoEchoResponse = response.json().await?;
        base64::engine::general_purpose::STANDARD
            .decode(echo.image_base64.as_bytes())
            .map_err(|e| UploadError::Response(format!("invalid image_base64: {}", e)))
    }
}
