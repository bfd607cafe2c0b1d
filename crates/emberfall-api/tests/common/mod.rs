#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use chrono::Duration;
use emberfall_api::token::TokenKeys;
use emberfall_api::{AppState, AppStateInner, router};
use emberfall_db::Database;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "test-secret";

pub struct TestContext {
    pub temp_dir: TempDir,
    pub state: AppState,
    pub app: axum::Router,
}

pub fn build_test_context() -> TestContext {
    build_test_context_with_ttl(emberfall_api::token::DEFAULT_TOKEN_TTL)
}

pub fn build_test_context_with_ttl(ttl: Duration) -> TestContext {
    let temp_dir = tempfile::tempdir().expect("temp dir should be created");
    let db = Database::open(&temp_dir.path().join("emberfall.db"), 2)
        .expect("database should open");

    let state = AppStateInner::new(Arc::new(db), TokenKeys::with_ttl(TEST_SECRET, ttl), false);
    let app = router(state.clone());

    TestContext {
        temp_dir,
        state,
        app,
    }
}

/// Send a request; returns status, parsed JSON body and the raw body bytes.
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let req_body = match body {
        Some(body) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };
    let req = builder.body(req_body).expect("request should build");

    let resp = app
        .clone()
        .oneshot(req)
        .await
        .expect("request should be handled");

    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).to_string()))
    };

    (status, json, bytes.to_vec())
}

pub async fn register(app: &axum::Router, username: &str, password: &str) -> (StatusCode, Value) {
    let (status, body, _) = send(
        app,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"username": username, "password": password})),
    )
    .await;
    (status, body)
}

/// Register a fresh account and return its token.
pub async fn register_and_get_token(app: &axum::Router, username: &str) -> String {
    let (status, body) = register(app, username, "hunter22").await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["data"]["token"]
        .as_str()
        .expect("token should exist")
        .to_string()
}

pub fn character_body(name: &str) -> Value {
    json!({
        "name": name,
        "race": "human",
        "gender": "male",
        "appearance": {"skinTone": "#c68642", "hairStyle": "short"},
        "stats": {
            "health": 100,
            "maxHealth": 100,
            "strength": 12,
            "magic": 4,
            "speed": 9,
            "defense": 7,
            "level": 1
        },
        "equipment": {"weapon": "rusty_sword", "armor": null, "helmet": null}
    })
}

pub async fn create_character(app: &axum::Router, token: &str, name: &str) -> Value {
    let (status, body, _) = send(
        app,
        "POST",
        "/api/characters/create",
        Some(token),
        Some(character_body(name)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"].clone()
}
