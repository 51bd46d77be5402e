//! User Endpoints
//! Mission: Let an authenticated caller inspect and rotate its own key

use crate::models::KeyGrant;
use crate::security::{ApiIdentity, ApiKeyStore};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use tracing::info;

/// Current key - GET /user/me
///
/// The gate attaches `ApiIdentity` on every forwarded protected request; its
/// absence here means the route was somehow reached unauthenticated, so we
/// answer 401 rather than assume.
pub async fn me(
    State(state): State<AppState>,
    identity: Option<Extension<ApiIdentity>>,
) -> Result<Json<KeyGrant>, UserApiError> {
    let Extension(ApiIdentity(identity)) = identity.ok_or(UserApiError::Unauthorized)?;

    let api_key = state.keys.issue_or_get(&identity);
    Ok(Json(KeyGrant { identity, api_key }))
}

/// Key rotation - POST /user/key/rotate
///
/// The key used to authenticate this very request stops working as soon as
/// the response is produced; the caller must switch to the returned key.
pub async fn rotate(
    State(state): State<AppState>,
    identity: Option<Extension<ApiIdentity>>,
) -> Result<Json<KeyGrant>, UserApiError> {
    let Extension(ApiIdentity(identity)) = identity.ok_or(UserApiError::Unauthorized)?;

    let api_key = state.keys.rotate(&identity);
    info!(identity, "API key rotated on user request");

    Ok(Json(KeyGrant { identity, api_key }))
}

#[derive(Debug)]
pub enum UserApiError {
    Unauthorized,
}

impl IntoResponse for UserApiError {
    fn into_response(self) -> Response {
        match self {
            UserApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized").into_response(),
        }
    }
}
