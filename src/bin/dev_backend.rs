//! Development backend for the chat widget

use chat_widget::dev_backend::{serve, AppState};
use chat_widget::config::DEV_BACKEND_LOG_FILTER;
use chat_widget::DevBackendConfig;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEV_BACKEND_LOG_FILTER.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = DevBackendConfig::from_env()?;
    let state = AppState::new(config.brands.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(brands = ?config.brands, "Development backend listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve(listener, state).await?;

    Ok(())
}
