use anyhow::Result;
use serde::Deserialize;

use crate::conferencing::ConferencingBackend;
use crate::media::MediaSourceKind;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub conferencing: ConferencingConfig,
    pub media: MediaConfig,
    pub translate: TranslateConfig,
    pub avatar: AvatarConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct ConferencingConfig {
    pub app_id: String,
    pub backend: ConferencingBackend,
}

#[derive(Debug, Deserialize)]
pub struct MediaConfig {
    pub source: MediaSourceKind,
    pub frame_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct TranslateConfig {
    pub upload_url: String,
    pub photo_url: String,
    pub realtime_url: String,
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct AvatarConfig {
    pub render_url: String,
    pub spoken: String,
    pub signed: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
