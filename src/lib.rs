//! CallableAPIs Backend Library
//!
//! Exposes core modules for use by the binary and integration tests.
//! `build_router` wires the full HTTP surface, including the bearer auth
//! gate, so tests exercise exactly what the binary serves.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod security;

use axum::{
    routing::{get, post},
    Router,
};
use config::AppConfig;
use security::{bearer_auth_middleware, ApiKeyService, GateState};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all request-handling tasks.
///
/// Built once at startup and cloned per handler; there is no hidden global
/// service instance anywhere.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub keys: Arc<ApiKeyService>,
    pub http_client: reqwest::Client,
}

impl AppState {
    pub fn new(config: AppConfig, http_client: reqwest::Client) -> Self {
        let keys = Arc::new(ApiKeyService::new(
            config.api_key_salt.clone(),
            config.rate_limit_qps,
        ));

        Self {
            config: Arc::new(config),
            keys,
            http_client,
        }
    }
}

/// Build the complete router: public routes, protected routes, and the
/// middleware stack. The gate layer wraps everything and classifies paths
/// itself, so route registration stays agnostic of which prefixes need a key.
pub fn build_router(state: AppState) -> Router {
    let gate = GateState {
        store: state.keys.clone(),
        limits: state.keys.clone(),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", get(handlers::auth::login))
        .route("/auth/callback", get(handlers::auth::callback))
        .route("/v1/calendar/date", get(handlers::calendar::v1_date))
        .route("/v2/calendar/date", get(handlers::calendar::v2_date))
        .route("/user/me", get(handlers::user::me))
        .route("/user/key/rotate", post(handlers::user::rotate))
        .layer(axum::middleware::from_fn_with_state(
            gate,
            bearer_auth_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "CallableAPIs operational"
}
