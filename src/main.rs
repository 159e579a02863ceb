//! jsonhub server entry point.
//!
//! Binds the hub's HTTP handler (subscribe over SSE, publish over POST)
//! to the configured address.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use jsonhub::api;
use jsonhub::app_state::AppState;
use jsonhub::config::{HubConfig, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = HubConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Text => subscriber.init(),
    }

    let listen_addr = config.listen_addr;
    tracing::info!(addr = %listen_addr, "starting jsonhub");

    // Build root exchange and router
    let app = api::build_app(AppState::new(config));

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("binding {listen_addr}"))?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(listener, app).await.context("serving HTTP")?;

    Ok(())
}
