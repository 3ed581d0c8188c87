//! Civicrank Web Server
//!
//! Run with: cargo run -p civicrank-web

use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use civicrank_common::Config;
use civicrank_web::{build_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Civicrank Web Server...");

    let config = Config::load()?;
    let addr = config.bind_address();
    info!(
        leaderboard = %config.leaderboard.dataset.display(),
        recommendation = %config.recommendation.dataset.display(),
        cache = config.artifacts.cache,
        "Loaded configuration"
    );

    let app = build_router(AppState::new(config));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
