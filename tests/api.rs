use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use coop_voting::{
    clock::FixedClock, routes::create_routes, state::AppState, store::MemoryStore,
};
use serde_json::{json, Value};
use tower::ServiceExt;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 3, 14, 9, 0, 0).unwrap()
}

fn app() -> (Router, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(start()));
    let state = AppState::new(MemoryStore::new(), clock.clone());
    (create_routes(state), clock)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => request.body(Body::empty()),
    }
    .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, value)
}

async fn create_topic(app: &Router) -> i64 {
    let (status, topic) = send(
        app,
        "POST",
        "/api/topics",
        Some(json!({ "name": "Solar panels", "description": "Buy panels for the warehouse" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    topic["id"].as_i64().unwrap()
}

async fn create_user(app: &Router, cpf: &str) -> i64 {
    let (status, user) = send(
        app,
        "POST",
        "/api/users",
        Some(json!({ "name": "Member", "cpf": cpf })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    user["id"].as_i64().unwrap()
}

#[tokio::test]
async fn poll_lifecycle_over_http() {
    let (app, clock) = app();
    let topic_id = create_topic(&app).await;

    let (status, poll) = send(
        &app,
        "POST",
        "/api/polls",
        Some(json!({ "topicId": topic_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let poll_id = poll["id"].as_i64().unwrap();
    assert_eq!(poll["topic"]["id"].as_i64(), Some(topic_id));

    let end_at: DateTime<Utc> = serde_json::from_value(poll["endAt"].clone()).unwrap();
    assert_eq!(end_at, start() + Duration::minutes(1));

    for (i, choice) in ["YES", "YES", "NO"].iter().enumerate() {
        let user_id = create_user(&app, &format!("0000000000{i}")).await;
        let (status, _) = send(
            &app,
            "POST",
            "/api/votes",
            Some(json!({ "vote": choice, "userId": user_id, "pollId": poll_id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, "GET", &format!("/api/polls/{poll_id}/status"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "OPEN" }));

    clock.advance(Duration::minutes(2));

    let (_, body) = send(&app, "GET", &format!("/api/polls/{poll_id}/status"), None).await;
    assert_eq!(body, json!({ "status": "CLOSED" }));

    let (status, body) = send(&app, "GET", &format!("/api/polls/{poll_id}/result"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "result": "APPROVED" }));

    let (_, polls) = send(&app, "GET", "/api/polls", None).await;
    assert_eq!(polls.as_array().map(Vec::len), Some(1));
    assert_eq!(polls[0]["votes"].as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn poll_errors_map_to_status_codes() {
    let (app, _) = app();

    let (status, body) = send(&app, "POST", "/api/polls", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "topic required" }));

    let (status, body) = send(&app, "POST", "/api/polls", Some(json!({ "topicId": 77 }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "topic not found" }));

    let topic_id = create_topic(&app).await;
    let past = start() - Duration::minutes(5);
    let (status, body) = send(
        &app,
        "POST",
        "/api/polls",
        Some(json!({ "topicId": topic_id, "endAt": past })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "poll end in the past" }));

    let (status, _) = send(
        &app,
        "POST",
        "/api/polls",
        Some(json!({ "topicId": topic_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        "POST",
        "/api/polls",
        Some(json!({ "topicId": topic_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "poll already running for this topic" }));

    let (status, body) = send(&app, "GET", "/api/polls/999/result", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "poll not found" }));
}

#[tokio::test]
async fn user_crud_over_http() {
    let (app, _) = app();
    let id = create_user(&app, "12345678900").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        Some(json!({ "name": "Copycat", "cpf": "12345678900" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "cpf already registered" }));

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/api/users/{id}"),
        Some(json!({ "name": "Renamed", "cpf": "12345678900" })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, user) = send(&app, "GET", &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["name"], "Renamed");

    let (status, _) = send(&app, "DELETE", &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/api/users/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, users) = send(&app, "GET", "/api/users", None).await;
    assert_eq!(users, json!([]));
}

#[tokio::test]
async fn blank_topic_name_is_rejected() {
    let (app, _) = app();

    let (status, body) = send(&app, "POST", "/api/topics", Some(json!({ "name": " " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "name required" }));

    let (_, topics) = send(&app, "GET", "/api/topics", None).await;
    assert_eq!(topics, json!([]));
}

#[tokio::test]
async fn undecodable_input_gets_error_body() {
    let (app, _) = app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/polls",
        Some(json!({ "topicId": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        "POST",
        "/api/votes",
        Some(json!({ "vote": "MAYBE", "userId": 1, "pollId": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, "GET", "/api/polls/abc/status", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}
