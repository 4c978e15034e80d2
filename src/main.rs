//! Free games notifier: binary entrypoint.
//! Starts the polling loop and serves the command/health/metrics router.

use std::sync::Arc;

use free_games_notifier::{
    api::{create_router, AppState},
    build_driver,
    chat::discord::DiscordClient,
    config::BotConfig,
    metrics::Metrics,
    scheduler,
};
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact logs filtered by RUST_LOG. The runtime may already have installed
/// a subscriber, in which case this is a no-op.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("free_games_notifier=info,warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = BotConfig::from_env()?;
    tracing::info!(
        channel = %cfg.channel_id,
        role = %cfg.role_name,
        interval_secs = cfg.poll_interval.as_secs(),
        "config loaded"
    );

    let metrics = Metrics::init(cfg.poll_interval)?;

    let platform = Arc::new(DiscordClient::new(cfg.token.clone()));
    let driver = Arc::new(build_driver(&cfg, platform));

    // Startup cycle runs in the background so the router comes up immediately.
    let startup = Arc::clone(&driver);
    let period = cfg.poll_interval;
    tokio::spawn(async move {
        let _periodic = scheduler::start(startup, period).await;
    });

    let state = AppState::new(driver, cfg.command_api_token.clone());
    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
