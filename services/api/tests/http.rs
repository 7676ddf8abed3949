//! End-to-end tests of the HTTP surface against the in-memory store and cache.

use api_lib::{
    adapters::{CannedFlashcardsAdapter, MokaCacheAdapter},
    config::Config,
    web::{build_router, AppState},
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use flashmind_core::{MemoryStore, ResourceService, ServiceSettings};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let config = Arc::new(Config::from_lookup(|_| None).unwrap());
    let db = Arc::new(MemoryStore::new());
    let resources = Arc::new(ResourceService::new(
        db.clone(),
        Arc::new(MokaCacheAdapter::default()),
        Arc::new(CannedFlashcardsAdapter),
        ServiceSettings::default(),
    ));
    build_router(Arc::new(AppState {
        db,
        config,
        resources,
    }))
    .unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Option<String>, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, set_cookie, json)
}

/// Signs up a fresh user and returns the `session=...` cookie pair.
async fn sign_up(app: &Router, username: &str) -> String {
    let (status, cookie, body) = send(
        app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "username": username, "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], username);
    cookie.expect("signup sets a session cookie")
}

async fn new_chat(app: &Router, cookie: &str, name: &str) -> String {
    let (status, _, body) = send(
        app,
        Method::POST,
        "/api/chats",
        Some(cookie),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

async fn new_lecture(app: &Router, cookie: &str, chat_id: &str, name: &str) -> String {
    let (status, _, body) = send(
        app,
        Method::POST,
        &format!("/api/chats/{}/lectures", chat_id),
        Some(cookie),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = app();
    let (status, _, _) = send(&app, Method::GET, "/api/chats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&app, Method::GET, "/api/chats", Some("session=made-up"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chats_are_listed_per_owner() {
    let app = app();
    let alice = sign_up(&app, "alice").await;
    let bob = sign_up(&app, "bob").await;

    new_chat(&app, &alice, "Biology").await;
    new_chat(&app, &alice, "History").await;
    new_chat(&app, &bob, "Physics").await;

    let (status, _, body) = send(&app, Method::GET, "/api/chats", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Biology", "History"]);
}

#[tokio::test]
async fn another_users_chat_is_forbidden() {
    let app = app();
    let alice = sign_up(&app, "alice").await;
    let mallory = sign_up(&app, "mallory").await;
    let chat_id = new_chat(&app, &alice, "Biology").await;
    new_lecture(&app, &alice, &chat_id, "Cells").await;

    let uri = format!("/api/chats/{}/lectures", chat_id);
    let (status, _, _) = send(&app, Method::GET, &uri, Some(&mallory), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, _) = send(
        &app,
        Method::POST,
        &uri,
        Some(&mallory),
        Some(json!({ "name": "Injected" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, _, body) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn duplicate_username_conflicts_and_bad_password_is_rejected() {
    let app = app();
    sign_up(&app, "alice").await;

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "username": "alice", "password": "another" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, cookie, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(cookie.is_none());

    let (status, cookie, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "alice", "password": "correct horse" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cookie.is_some());
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = app();
    let alice = sign_up(&app, "alice").await;

    let (status, _, _) = send(&app, Method::POST, "/api/auth/logout", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&app, Method::GET, "/api/chats", Some(&alice), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn flashcard_status_round_trip_through_lecture_detail() {
    let app = app();
    let alice = sign_up(&app, "alice").await;
    let chat_id = new_chat(&app, &alice, "Biology").await;
    let lecture_id = new_lecture(&app, &alice, &chat_id, "Cells").await;
    let cards_uri = format!("/api/chats/{}/lectures/{}/flashcards", chat_id, lecture_id);

    let (status, _, body) = send(
        &app,
        Method::POST,
        &cards_uri,
        Some(&alice),
        Some(json!({ "cards": [{ "front": "Powerhouse of the cell?", "back": "Mitochondria" }] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let card_id = body[0]["id"].as_str().unwrap().to_string();

    // Prime the lecture cache, then mutate.
    let lecture_uri = format!("/api/chats/{}/lectures/{}", chat_id, lecture_id);
    send(&app, Method::GET, &lecture_uri, Some(&alice), None).await;

    let card_uri = format!("{}/{}", cards_uri, card_id);
    let (status, _, body) = send(
        &app,
        Method::PATCH,
        &card_uri,
        Some(&alice),
        Some(json!({ "isKnown": true, "isReview": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isKnown"], true);

    let (_, _, body) = send(&app, Method::GET, &lecture_uri, Some(&alice), None).await;
    assert_eq!(body["flashcards"][0]["isKnown"], true);
    assert_eq!(body["flashcards"][0]["isReview"], false);

    let (status, _, _) = send(
        &app,
        Method::PATCH,
        &card_uri,
        Some(&alice),
        Some(json!({ "isKnown": true, "isReview": true })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_lecture_in_own_chat_is_not_found() {
    let app = app();
    let alice = sign_up(&app, "alice").await;
    let chat_id = new_chat(&app, &alice, "Biology").await;

    let uri = format!("/api/chats/{}/lectures/{}", chat_id, uuid::Uuid::new_v4());
    let (status, _, _) = send(&app, Method::GET, &uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn generation_endpoints() {
    let app = app();
    let alice = sign_up(&app, "alice").await;

    let (status, _, body) =
        send(&app, Method::POST, "/api/generate/dummy", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cards"].as_array().unwrap().len(), 5);
    assert_eq!(body["cards"][1]["back"], "Paris");

    let (status, _, _) = send(
        &app,
        Method::POST,
        "/api/generate",
        Some(&alice),
        Some(json!({ "notes": "too short" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(
        &app,
        Method::POST,
        "/api/generate",
        Some(&alice),
        Some(json!({ "notes": "The cell is the basic unit of life." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cards"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn lecture_flashcards_are_generated_from_saved_notes() {
    let app = app();
    let alice = sign_up(&app, "alice").await;
    let chat_id = new_chat(&app, &alice, "Biology").await;
    let lecture_id = new_lecture(&app, &alice, &chat_id, "Cells").await;
    let lecture_uri = format!("/api/chats/{}/lectures/{}", chat_id, lecture_id);
    let generate_uri = format!("{}/flashcards/generate", lecture_uri);

    // Fresh lectures have no notes yet.
    let (status, _, _) = send(&app, Method::POST, &generate_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(
        &app,
        Method::PUT,
        &format!("{}/notes", lecture_uri),
        Some(&alice),
        Some(json!({ "notes": "Cells contain organelles such as mitochondria." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["notes"].as_str().unwrap().starts_with("Cells"));

    let (status, _, body) = send(&app, Method::POST, &generate_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.as_array().unwrap().len(), 5);

    let (_, _, body) = send(&app, Method::GET, &lecture_uri, Some(&alice), None).await;
    assert_eq!(body["flashcards"].as_array().unwrap().len(), 5);
}
