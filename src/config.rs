//! Application configuration from environment variables.
//!
//! Every knob has a documented dev default so the service boots without any
//! environment; the GitHub OAuth credentials are the one exception and the
//! auth endpoints report their absence at request time instead.

use anyhow::{Context, Result};
use reqwest::Url;
use std::env;
use tracing::warn;

const DEFAULT_PUBLIC_BASE_URL: &str = "https://api.callableapis.com";
const DEFAULT_SALT: &str = "dev-salt";
const DEFAULT_RATE_LIMIT_QPS: u32 = 10;

pub const GITHUB_AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const GITHUB_USER_API_URL: &str = "https://api.github.com/user";
const GITHUB_OAUTH_SCOPE: &str = "read:user user:email";

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Secret mixed into every key derivation. Must stay stable for the
    /// process lifetime or issuance stops being idempotent.
    pub api_key_salt: String,
    /// Default permits/second for every new limiter bucket.
    pub rate_limit_qps: u32,
    pub github_client_id: Option<String>,
    pub github_client_secret: Option<String>,
    pub public_base_url: String,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let api_key_salt = match env::var("API_KEY_SALT") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => {
                warn!("API_KEY_SALT not set - using dev default salt, keys are predictable");
                DEFAULT_SALT.to_string()
            }
        };

        let rate_limit_qps = env::var("API_RATE_LIMIT_QPS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_QPS)
            .max(1);

        let github_client_id = env::var("GITHUB_CLIENT_ID")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let github_client_secret = env::var("GITHUB_CLIENT_SECRET")
            .ok()
            .filter(|v| !v.trim().is_empty());

        let public_base_url = env::var("PUBLIC_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PUBLIC_BASE_URL.to_string());

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Self {
            api_key_salt,
            rate_limit_qps,
            github_client_id,
            github_client_secret,
            public_base_url,
            bind_addr,
        }
    }

    pub fn github_callback_url(&self) -> String {
        format!("{}/auth/callback", self.public_base_url)
    }

    /// GitHub authorize URL for the OAuth redirect, with the caller-supplied
    /// CSRF `state` parameter.
    pub fn github_authorize_url(&self, client_id: &str, state: &str) -> Result<Url> {
        Url::parse_with_params(
            GITHUB_AUTHORIZE_URL,
            &[
                ("client_id", client_id),
                ("redirect_uri", self.github_callback_url().as_str()),
                ("scope", GITHUB_OAUTH_SCOPE),
                ("state", state),
            ],
        )
        .context("Failed to build GitHub authorize URL")
    }
}
