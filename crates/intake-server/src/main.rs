use std::sync::Arc;

use anyhow::Context;
use intake_agent::select_backend;
use intake_core::config::Config;
use intake_server::logging::{new_ring, BroadcastLayer};
use intake_server::{app, AppState, DEFAULT_LOG_FILTER};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let (log_tx, _log_rx) = broadcast::channel::<String>(256);
    let log_ring = new_ring();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(BroadcastLayer::new(log_tx.clone(), log_ring.clone(), config.log_ring_size))
        .init();

    let backend = select_backend(&config);
    let state = Arc::new(AppState::new(backend, &config.firm_name, log_tx, log_ring));

    let addr = format!("{}:{}", config.web_bind, config.web_port);
    info!(firm = %config.firm_name, "Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
