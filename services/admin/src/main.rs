use admin::config::AdminConfig;
use admin::sim::SimulatedCore;
use admin::{create_router, logging, AppState};
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = AdminConfig::parse();
    logging::init(&config.log_filter, config.log_json);

    tracing::info!("Starting admin API service");

    // The binary runs against the in-memory engine.
    let core = Arc::new(SimulatedCore::demo());
    let state = AppState::new(core).with_limits(config.limits());

    let app = create_router(state);

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "admin API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("admin API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
