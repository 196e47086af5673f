use std::net::SocketAddr;

use anyhow::Context;
use tracing::{error, info};

use admin_analytics_core::app_state::build_app_state;
use admin_analytics_core::config::AppConfig;
use admin_analytics_core::core::store::build_document_store;
use admin_analytics_core::debug::run_debug;
use admin_analytics_core::logging::init_logging;
use admin_analytics_core::routes::app_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let _guard = init_logging(&config.log_dir)?;

    let store = build_document_store(&config)?;
    info!(store = store.kind(), "Document store ready");

    if config.debug_mode {
        return run_debug(store, config.debug_query_file.as_deref()).await;
    }

    let state = build_app_state(&config, store);
    let app = app_router(&state).with_state(state);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 Server running at http://{}", addr);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %err, "Server error");
        return Err(err.into());
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
