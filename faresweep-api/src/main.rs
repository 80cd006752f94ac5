use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use faresweep_api::middleware::{RateLimiter, RateTier};
use faresweep_api::{app, keepalive, AppState};
use faresweep_store::{Config, FareFinderClient};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "faresweep_api=debug,faresweep_engine=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting faresweep on port {}", config.server.port);

    let provider = FareFinderClient::new(&config.provider).context("Failed to build fare finder client")?;

    let tiers = config
        .rate_limit
        .tiers
        .iter()
        .map(|tier| RateTier::new(tier.limit, tier.window()))
        .collect();

    let app_state = AppState::new(
        Arc::new(provider),
        RateLimiter::new(tiers),
        config.stream.pacing(),
    );

    // Independent of request handling
    keepalive::spawn_keepalive(&config.keepalive);

    let app = app(app_state, &config.cors.allowed_origins);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>()
    ).await?;

    Ok(())
}
