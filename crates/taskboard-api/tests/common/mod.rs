#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use taskboard_api::auth::{AppState, AppStateInner};
use taskboard_api::credentials::PasswordScheme;
use taskboard_api::seed;
use taskboard_db::Database;

pub const HOMER: (&str, &str) = ("homer", "1234");
pub const BART: (&str, &str) = ("bart", "1234");

/// A router over a private, freshly seeded in-memory database.
pub fn app() -> Router {
    app_with_scheme(PasswordScheme::Plaintext)
}

pub fn app_with_scheme(scheme: PasswordScheme) -> Router {
    let state: AppState = Arc::new(AppStateInner {
        db: Database::open_in_memory().unwrap(),
        credentials: scheme.verifier(),
    });
    seed::reset(&state).unwrap();
    taskboard_api::router(state)
}

pub fn basic_auth((username, password): (&str, &str)) -> String {
    format!("Basic {}", B64.encode(format!("{}:{}", username, password)))
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    credentials: Option<(&str, &str)>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(credentials) = credentials {
        builder = builder.header(header::AUTHORIZATION, basic_auth(credentials));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

pub async fn get(app: &Router, uri: &str, credentials: (&str, &str)) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Some(credentials), None).await
}

pub async fn post(
    app: &Router,
    uri: &str,
    credentials: (&str, &str),
    body: Value,
) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(credentials), Some(body)).await
}

pub async fn put(
    app: &Router,
    uri: &str,
    credentials: (&str, &str),
    body: Value,
) -> (StatusCode, Value) {
    send(app, Method::PUT, uri, Some(credentials), Some(body)).await
}

pub async fn delete(app: &Router, uri: &str, credentials: (&str, &str)) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, Some(credentials), None).await
}

/// Creates a project for `credentials` and returns its id.
pub async fn create_project(app: &Router, credentials: (&str, &str), title: &str) -> i64 {
    let (status, body) = post(
        app,
        "/api/projects/",
        credentials,
        serde_json::json!({ "title": title }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

/// Creates a task under `project_id` and returns its id.
pub async fn create_task(
    app: &Router,
    credentials: (&str, &str),
    project_id: i64,
    title: &str,
) -> i64 {
    let (status, body) = post(
        app,
        &format!("/api/projects/{}/tasks/", project_id),
        credentials,
        serde_json::json!({ "title": title, "completed": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}
