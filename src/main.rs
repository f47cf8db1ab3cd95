use std::sync::Arc;

use dispatch_market::api;
use dispatch_market::config::Config;
use dispatch_market::engine::expiry::run_pool_expiry;
use dispatch_market::error::AppError;
use dispatch_market::state::AppState;
use dispatch_market::store::reference::ReferenceSeed;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false)
        .compact()
        .init();

    let state = AppState::new(config.dispatch.clone(), config.event_buffer_size);
    match &config.seed_path {
        Some(path) => state.store.reference.load(ReferenceSeed::from_file(path)?),
        None => tracing::warn!("SEED_PATH not set, reference tables are empty"),
    }
    let shared_state = Arc::new(state);

    let app = api::rest::router(shared_state.clone());

    tokio::spawn(run_pool_expiry(shared_state.clone()));

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(http_port = config.http_port, "http server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::Internal(format!("server error: {err}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
