//! CallableAPIs - API key issuance and rate-limited bearer auth gateway
//! Mission: No request touches business logic without a live, in-quota key

use anyhow::{Context, Result};
use callableapis_backend::{build_router, config::AppConfig, AppState};
use dotenv::dotenv;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    init_tracing();

    let config = AppConfig::from_env();
    info!(
        qps = config.rate_limit_qps,
        oauth_configured = config.github_client_id.is_some(),
        "🔐 CallableAPIs gateway starting"
    );

    // Shared client for the GitHub OAuth exchange; GitHub's API rejects
    // requests without a User-Agent.
    let http_client = reqwest::Client::builder()
        .user_agent("callableapis-backend")
        .timeout(Duration::from_secs(10))
        .build()
        .context("Failed to build HTTP client")?;

    let addr = config.bind_addr.clone();
    let state = AppState::new(config, http_client);
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Initialize tracing with env-filter overrides
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "callableapis_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
