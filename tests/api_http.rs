// tests/api_http.rs
//
// Router tests without opening sockets, via tower::ServiceExt::oneshot.
mod common;

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use common::{driver_with, ready_platform, ScriptedSource, GUILD};
use free_games_notifier::api::{create_router, AppState};
use free_games_notifier::chat::mock::MockPlatform;
use free_games_notifier::chat::UserId;
use serde_json::Value as Json;
use tower::ServiceExt as _;

const BODY_LIMIT: usize = 1024 * 1024;

fn test_router(token: Option<&str>) -> (Router, Arc<MockPlatform>) {
    let platform = ready_platform();
    platform.add_member(GUILD, UserId(5));
    let driver = Arc::new(driver_with(&ScriptedSource::default(), platform.clone()));
    let state = AppState::new(driver, token.map(str::to_string));
    (create_router(state), platform)
}

async fn json_body(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn health_returns_ok() {
    let (app, _) = test_router(None);
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn join_command_accepts_string_snowflakes() {
    let (app, platform) = test_router(None);
    let req = Request::builder()
        .method("POST")
        .uri("/commands/joinfreegames")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"guild_id":"222","user_id":"5"}"#))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = json_body(resp).await;
    assert_eq!(v["outcome"], "granted");
    assert_eq!(platform.add_role_calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn check_command_acknowledges() {
    let (app, _) = test_router(None);
    let req = Request::builder()
        .method("POST")
        .uri("/commands/checkfreegames")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = json_body(resp).await;
    assert_eq!(v["outcome"], "check_started");
    assert_eq!(v["content"], "Manually checking for free games...");
}

#[tokio::test]
async fn commands_require_bearer_when_configured() {
    let (app, _) = test_router(Some("s3cret"));

    let denied = Request::builder()
        .method("POST")
        .uri("/commands/checkfreegames")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(denied).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let allowed = Request::builder()
        .method("POST")
        .uri("/commands/checkfreegames")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(allowed).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    // health stays open
    let (app, _) = test_router(Some("s3cret"));
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}
