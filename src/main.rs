//! Application entry point for the Topic Explainer web server.
//!
//! # Startup sequence
//!
//! 1. Load `.env` (if present) into the process environment.
//! 2. Initialise logging.
//! 3. Load [`AppConfig`] from disk (returns default on first run).
//! 4. Build the request pipeline (Gemini + espeak-ng) from config.
//! 5. Make sure the static directory exists.
//! 6. Bind the listener and serve the axum router until shutdown.

use std::sync::Arc;

use anyhow::Context;
use topic_explainer::{config::AppConfig, pipeline::RequestPipeline, web};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. .env: missing file is fine
    let dotenv = dotenvy::dotenv();

    // 2. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Topic Explainer starting up");
    if let Ok(path) = dotenv {
        log::debug!("loaded environment from {}", path.display());
    }

    // 3. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        AppConfig::default()
    });
    log::info!(
        "mode {:?}, model {}, audio -> {}",
        config.output_mode,
        config.llm.model,
        config.tts.output_file.display()
    );

    // 4. Pipeline (API key absence is reported on the first request)
    let pipeline = Arc::new(RequestPipeline::from_config(&config));

    // 5. Static directory
    std::fs::create_dir_all(&config.server.static_dir).with_context(|| {
        format!(
            "creating static directory {}",
            config.server.static_dir.display()
        )
    })?;

    // 6. Serve
    let app = web::router(pipeline, &config.server.static_dir);
    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    log::info!("listening on http://{addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
