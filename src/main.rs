use std::sync::Arc;

use delivery_router::api;
use delivery_router::config::{self, LogFormat};
use delivery_router::error::AppError;
use delivery_router::geo::distance::DistanceProvider;
use delivery_router::geo::routing::OsrmClient;
use delivery_router::state::AppState;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = config::Config::from_env()?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .with_target(false);
    match config.log_format {
        LogFormat::Json => subscriber.json().init(),
        LogFormat::Compact => subscriber.compact().init(),
    }

    let routing = OsrmClient::new(
        &config.routing_base_url,
        &config.routing_profile,
        config.routing_timeout,
    )
    .map_err(|err| AppError::Internal(format!("failed to build routing client: {err}")))?;
    let distance = DistanceProvider::new(
        Arc::new(routing),
        config.routing_timeout,
        config.fallback_speed_kmh,
    );

    let shared_state = Arc::new(AppState::new(distance, config.timezone));
    let app = api::rest::router(shared_state);

    let bind_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|err| AppError::Internal(format!("failed to bind {bind_addr}: {err}")))?;

    tracing::info!(
        http_port = config.http_port,
        routing_base_url = %config.routing_base_url,
        timezone = config.timezone.name(),
        "http server started"
    );

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
