//! End-to-end gate scenarios against the full router.
//!
//! Drives the same router the binary serves, with a real key service and
//! limiter, using `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use callableapis_backend::{
    build_router, config::AppConfig, security::ApiKeyStore, AppState,
};
use serde_json::Value;
use tower::ServiceExt;

fn test_state(rate_limit_qps: u32) -> AppState {
    let config = AppConfig {
        api_key_salt: "test-salt".to_string(),
        rate_limit_qps,
        github_client_id: None,
        github_client_secret: None,
        public_base_url: "http://localhost:3000".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
    };
    AppState::new(config, reqwest::Client::new())
}

fn get(path: &str, bearer: Option<&str>) -> Request<Body> {
    with_method("GET", path, bearer)
}

fn with_method(method: &str, path: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(path);
    if let Some(token) = bearer {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let app = build_router(test_state(10));

    let response = send(&app, get("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn protected_path_without_header_is_401() {
    let app = build_router(test_state(10));

    let response = send(&app, get("/v1/calendar/date", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "Missing Bearer token");
}

#[tokio::test]
async fn empty_bearer_token_is_401() {
    let app = build_router(test_state(10));

    let response = send(&app, get("/v1/calendar/date", Some(""))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(response).await, "Empty token");
}

#[tokio::test]
async fn unknown_token_is_403() {
    let app = build_router(test_state(10));

    let response = send(&app, get("/v1/calendar/date", Some("zzz"))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(response).await, "Invalid API key");
}

#[tokio::test]
async fn valid_key_forwards_until_quota_is_spent() {
    let state = test_state(3);
    let key = state.keys.issue_or_get("github:octocat");
    let app = build_router(state);

    for _ in 0..3 {
        let response = send(&app, get("/v1/calendar/date", Some(&key))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let date = body_json(response).await;
        assert!(date["year"].as_i64().unwrap() >= 2024);
        assert!(date["month"].as_u64().unwrap() <= 11); // v1 months are 0-based
    }

    let response = send(&app, get("/v1/calendar/date", Some(&key))).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body_string(response).await, "Rate limit exceeded");
}

#[tokio::test]
async fn v2_date_reports_one_based_month_and_iso() {
    let state = test_state(10);
    let key = state.keys.issue_or_get("github:octocat");
    let app = build_router(state);

    let response = send(&app, get("/v2/calendar/date", Some(&key))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let datetime = body_json(response).await;
    let month = datetime["month"].as_u64().unwrap();
    assert!((1..=12).contains(&month));
    assert!(datetime["iso"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn me_returns_the_issued_key_and_identity() {
    let state = test_state(10);
    let key = state.keys.issue_or_get("github:octocat");
    let app = build_router(state);

    let response = send(&app, get("/user/me", Some(&key))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let grant = body_json(response).await;
    assert_eq!(grant["identity"], "github:octocat");
    assert_eq!(grant["apiKey"], Value::String(key));
}

#[tokio::test]
async fn rotation_invalidates_the_old_key_immediately() {
    let state = test_state(10);
    let old_key = state.keys.issue_or_get("github:octocat");
    let app = build_router(state);

    let response = send(&app, with_method("POST", "/user/key/rotate", Some(&old_key))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let grant = body_json(response).await;
    let new_key = grant["apiKey"].as_str().unwrap().to_string();
    assert_ne!(new_key, old_key);

    // The key that authenticated the rotation is now dead.
    let response = send(&app, get("/user/me", Some(&old_key))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_string(response).await, "Invalid API key");

    // And the replacement works for the same identity.
    let response = send(&app, get("/user/me", Some(&new_key))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let grant = body_json(response).await;
    assert_eq!(grant["identity"], "github:octocat");
}

#[tokio::test]
async fn callback_without_code_is_400() {
    let app = build_router(test_state(10));

    let response = send(&app, get("/auth/callback", None)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_string(response).await, "Missing code");
}

#[tokio::test]
async fn login_without_oauth_config_is_500() {
    let app = build_router(test_state(10));

    let response = send(&app, get("/auth/login", None)).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
