mod compose;
mod config;
mod errors;
mod handlers;
mod hubspot;
mod lead;
mod mailer;
mod models;
mod rate_limit;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::handlers::AppState;
use crate::hubspot::HubSpotClient;
use crate::mailer::Mailer;
use crate::rate_limit::RateLimiter;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration (failing fast on missing required
/// values), builds the external-service clients and starts the Axum server.
/// The listener is served with connect info so the transport peer address is
/// available for rate-limit keying.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_capture_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration; missing required CRM settings abort startup.
    let config = Config::from_env()?;

    let hubspot = HubSpotClient::new(config.hubspot_base_url.clone(), config.hubspot_token.clone())
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    tracing::info!("HubSpot client initialized: {}", config.hubspot_base_url);

    let mailer = Mailer::new(config.resend_base_url.clone(), config.resend_api_key.clone())
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    tracing::info!("Email client initialized: {}", config.resend_base_url);

    let port = config.port;
    let app_state = Arc::new(AppState {
        config,
        hubspot,
        mailer,
        rate_limiter: RateLimiter::new(),
    });

    let app = handlers::router(app_state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
