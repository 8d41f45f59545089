use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::application::routes::app_router;
use crate::application::services::BatchSettings;
use crate::application::state::{AppState, AppStateConfig};
use crate::infrastructure::image_generator::GEMINI_API_KEY_SETTING;
use crate::infrastructure::prompt_enhancer::OPENAI_API_KEY_SETTING;

pub struct ServerConfig {
    pub bind_address: SocketAddr,
    pub base_url: String,
    pub upload_dir: PathBuf,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub batch: BatchSettings,
}

pub async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    // Missing keys only fail the generation calls that need them.
    for (setting, value) in [
        (OPENAI_API_KEY_SETTING, &config.openai_api_key),
        (GEMINI_API_KEY_SETTING, &config.gemini_api_key),
    ] {
        if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
            warn!(setting, "API key not configured; generation requests will fail");
        }
    }

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create upload directory {}",
                config.upload_dir.display()
            )
        })?;

    let state = AppState::from_config(AppStateConfig {
        base_url: config.base_url.clone(),
        upload_dir: config.upload_dir.clone(),
        openai_api_key: config.openai_api_key,
        openai_model: config.openai_model,
        gemini_api_key: config.gemini_api_key,
        gemini_model: config.gemini_model,
        batch: config.batch,
        ..AppStateConfig::default()
    });

    let listener = TcpListener::bind(config.bind_address)
        .await
        .with_context(|| format!("failed to bind to {}", config.bind_address))?;

    let app = app_router(state);

    info!(
        address = %config.bind_address,
        base_url = %config.base_url,
        upload_dir = %config.upload_dir.display(),
        batch_mode = %config.batch.mode,
        batch_size = config.batch.size(),
        "starting HTTP server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated unexpectedly")?;

    info!("server shutdown complete");

    Ok(())
}

#[allow(clippy::expect_used)] // Startup: panicking is appropriate if signal handlers fail
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
