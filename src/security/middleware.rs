//! Authentication Gate
//! Mission: Classify every inbound request before any handler runs

use crate::security::key_store::{ApiKeyStore, RateLimitService};
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Path prefixes (leading slash stripped) that require a valid bearer token.
/// Everything else is public for docs, health checks, and the OAuth flow.
const PROTECTED_PREFIXES: [&str; 3] = ["v1/", "v2/", "user/"];

/// Identity resolved for the current request, written once by the gate and
/// read by downstream handlers. Absent on unprotected paths.
#[derive(Debug, Clone)]
pub struct ApiIdentity(pub String);

/// Store and limiter capabilities consumed by the gate; `dyn` so tests can
/// substitute fakes without touching the decision procedure.
#[derive(Clone)]
pub struct GateState {
    pub store: Arc<dyn ApiKeyStore>,
    pub limits: Arc<dyn RateLimitService>,
}

fn is_protected_path(path: &str) -> bool {
    let path = path.strip_prefix('/').unwrap_or(path);
    PROTECTED_PREFIXES
        .iter()
        .any(|prefix| path.starts_with(prefix))
}

/// Gate middleware run in front of every route.
///
/// Unprotected paths pass straight through. Protected paths must carry
/// `Authorization: Bearer <key>` where the key resolves to an identity and
/// has quota left; each failure short-circuits with its own status code so
/// callers can tell "no credential" (401) from "unknown credential" (403)
/// from "out of quota" (429).
pub async fn bearer_auth_middleware(
    State(gate): State<GateState>,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    if !is_protected_path(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(GateError::MissingBearer)?
        .trim();
    if token.is_empty() {
        return Err(GateError::EmptyToken);
    }

    let identity = gate.store.lookup(token).ok_or(GateError::InvalidKey)?;

    if !gate.limits.try_acquire(token) {
        return Err(GateError::RateLimited);
    }

    req.extensions_mut().insert(ApiIdentity(identity));
    Ok(next.run(req).await)
}

/// Gate rejections, each terminal for the request.
#[derive(Debug)]
pub enum GateError {
    MissingBearer,
    EmptyToken,
    InvalidKey,
    RateLimited,
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GateError::MissingBearer => (StatusCode::UNAUTHORIZED, "Missing Bearer token"),
            GateError::EmptyToken => (StatusCode::UNAUTHORIZED, "Empty token"),
            GateError::InvalidKey => (StatusCode::FORBIDDEN, "Invalid API key"),
            GateError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded"),
        };

        (status, message).into_response()
    }
}
