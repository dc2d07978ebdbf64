use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use signcall::{
    create_router, AppState, Config, ConferencingFactory, HttpUploader, MediaSourceFactory,
};
use tracing::info;

/// Client-side orchestration service for translated video calls.
#[derive(Debug, Parser)]
#[command(name = "signcall", version)]
struct Args {
    /// Path to the configuration file (without extension).
    #[arg(long, default_value = "config/signcall")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Arc::new(Config::load(&args.config)?);

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let conferencing = ConferencingFactory::create(cfg.conferencing.backend)
        .context("Failed to create conferencing client")?;
    let media_source = MediaSourceFactory::create(
        cfg.media.source,
        Duration::from_millis(cfg.media.frame_interval_ms),
    )
    .context("Failed to create media source")?;
    let uploader = Arc::new(HttpUploader::new(
        cfg.translate.upload_url.clone(),
        cfg.translate.photo_url.clone(),
    )?);

    let state = AppState::new(Arc::clone(&cfg), conferencing, media_source, uploader);
    let router = create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("Control API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, router).await?;

    Ok(())
}
