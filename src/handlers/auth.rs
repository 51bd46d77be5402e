//! GitHub OAuth Endpoints
//! Mission: Turn a GitHub login into an identity and hand back its API key

use crate::config::{GITHUB_TOKEN_URL, GITHUB_USER_API_URL};
use crate::models::KeyGrant;
use crate::security::ApiKeyStore;
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

/// Login endpoint - GET /auth/login
///
/// Redirects the browser to GitHub's authorize page. The `state` parameter
/// is generated fresh per redirect; a real deployment would also pin it in a
/// cookie for the callback to verify.
pub async fn login(State(state): State<AppState>) -> Result<Redirect, AuthApiError> {
    let client_id = state
        .config
        .github_client_id
        .as_deref()
        .ok_or(AuthApiError::OAuthNotConfigured)?;

    let csrf_state = Uuid::new_v4().to_string();
    let authorize = state
        .config
        .github_authorize_url(client_id, &csrf_state)
        .map_err(|e| {
            warn!("Failed to build authorize URL: {}", e);
            AuthApiError::OAuthNotConfigured
        })?;

    Ok(Redirect::to(authorize.as_str()))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    #[allow(dead_code)]
    pub state: Option<String>,
}

/// Callback endpoint - GET /auth/callback
///
/// Exchanges the authorization code for an access token, resolves the GitHub
/// login, and returns the (issued-if-new) API key for `github:<login>`.
pub async fn callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Json<KeyGrant>, AuthApiError> {
    let code = params
        .code
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or(AuthApiError::MissingCode)?;

    let access_token = exchange_code_for_token(&state, code).await?;
    let login = fetch_github_login(&state, &access_token).await?;

    let identity = format!("github:{login}");
    let api_key = state.keys.issue_or_get(&identity);

    info!(identity, "OAuth callback completed");

    Ok(Json(KeyGrant { identity, api_key }))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

async fn exchange_code_for_token(state: &AppState, code: &str) -> Result<String, AuthApiError> {
    let client_id = state
        .config
        .github_client_id
        .as_deref()
        .ok_or(AuthApiError::OAuthNotConfigured)?;
    let client_secret = state
        .config
        .github_client_secret
        .as_deref()
        .ok_or(AuthApiError::OAuthNotConfigured)?;

    let resp = state
        .http_client
        .post(GITHUB_TOKEN_URL)
        .header("Accept", "application/json")
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("code", code),
            ("redirect_uri", state.config.github_callback_url().as_str()),
        ])
        .send()
        .await
        .map_err(|e| {
            warn!("GitHub token exchange request failed: {}", e);
            AuthApiError::TokenExchangeFailed
        })?;

    if !resp.status().is_success() {
        return Err(AuthApiError::TokenExchangeFailed);
    }

    resp.json::<TokenResponse>()
        .await
        .ok()
        .and_then(|t| t.access_token)
        .filter(|t| !t.trim().is_empty())
        .ok_or(AuthApiError::TokenExchangeFailed)
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: Option<String>,
}

async fn fetch_github_login(state: &AppState, access_token: &str) -> Result<String, AuthApiError> {
    let resp = state
        .http_client
        .get(GITHUB_USER_API_URL)
        .header("Accept", "application/json")
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| {
            warn!("GitHub user fetch failed: {}", e);
            AuthApiError::UserFetchFailed
        })?;

    if !resp.status().is_success() {
        return Err(AuthApiError::UserFetchFailed);
    }

    resp.json::<GithubUser>()
        .await
        .ok()
        .and_then(|u| u.login)
        .filter(|l| !l.trim().is_empty())
        .ok_or(AuthApiError::UserFetchFailed)
}

/// OAuth flow errors.
#[derive(Debug)]
pub enum AuthApiError {
    OAuthNotConfigured,
    MissingCode,
    TokenExchangeFailed,
    UserFetchFailed,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::OAuthNotConfigured => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "GitHub OAuth not configured",
            ),
            AuthApiError::MissingCode => (StatusCode::BAD_REQUEST, "Missing code"),
            AuthApiError::TokenExchangeFailed => (StatusCode::BAD_GATEWAY, "Token exchange failed"),
            AuthApiError::UserFetchFailed => (StatusCode::BAD_GATEWAY, "Failed to fetch user"),
        };

        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_api_error_responses() {
        let missing = AuthApiError::MissingCode.into_response();
        assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

        let exchange = AuthApiError::TokenExchangeFailed.into_response();
        assert_eq!(exchange.status(), StatusCode::BAD_GATEWAY);

        let user = AuthApiError::UserFetchFailed.into_response();
        assert_eq!(user.status(), StatusCode::BAD_GATEWAY);

        let unconfigured = AuthApiError::OAuthNotConfigured.into_response();
        assert_eq!(unconfigured.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
