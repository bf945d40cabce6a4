//! Service binary: environment-driven configuration, logging, HTTP serving.

use mailcode::{create_router, AppState, ServiceConfig};
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("mailcode=info")),
        )
        .init();

    let config = config_from_env()?;
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(3000);

    info!(
        api_base_url = %config.api_base_url,
        imap_host = %config.imap_host,
        poll_attempts = config.polling.attempts,
        "starting mailcode"
    );

    let state = AppState::new(config)?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!(port, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to install shutdown handler");
        return;
    }
    info!("shutdown signal received");
}

/// Builds the service configuration from `MAILCODE_*` environment variables.
fn config_from_env() -> mailcode::Result<ServiceConfig> {
    let mut builder = ServiceConfig::builder();

    if let Ok(url) = env::var("MAILCODE_API_BASE_URL") {
        builder = builder.api_base_url(url);
    }
    if let Ok(host) = env::var("MAILCODE_IMAP_HOST") {
        builder = builder.imap_host(host);
    }
    if let Some(port) = env_parse::<u16>("MAILCODE_IMAP_PORT") {
        builder = builder.imap_port(port);
    }
    if let Some(attempts) = env_parse::<u32>("MAILCODE_POLL_ATTEMPTS") {
        builder = builder.poll_attempts(attempts);
    }
    if let Some(secs) = env_parse::<u64>("MAILCODE_POLL_INTERVAL_SECS") {
        builder = builder.poll_interval(std::time::Duration::from_secs(secs));
    }
    if let Ok(senders) = env::var("MAILCODE_ALLOWED_SENDERS") {
        builder = builder.allowed_senders(
            senders
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        );
    }

    builder.build()
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|value| value.parse().ok())
}
