// HTTP surface tests driven through the axum router with `oneshot`

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use common::test_context;
use identity_service::http::build_router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn router() -> Router {
    build_router(test_context().auth)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn test_health() {
    let response = router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"OK");
}

#[tokio::test]
async fn test_register_and_login() {
    let app = router();
    let credentials = json!({ "email": "alice@test.com", "password": "Secret123!" });

    let response = app
        .clone()
        .oneshot(post_json("/api/auth/register", credentials.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let registered: bool = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(registered);

    let response = app
        .oneshot(post_json("/api/auth/login", credentials))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(body["token"].as_str().unwrap().split('.').count(), 3);
    assert!(body["expirationAtUtc"].is_string());
}

#[tokio::test]
async fn test_register_failure_is_false() {
    let response = router()
        .oneshot(post_json(
            "/api/auth/register",
            json!({ "email": "alice@test.com", "password": "weak" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let registered: bool = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(!registered);
}

#[tokio::test]
async fn test_login_failures_are_empty_401() {
    let app = router();
    app.clone()
        .oneshot(post_json(
            "/api/auth/register",
            json!({ "email": "alice@test.com", "password": "Secret123!" }),
        ))
        .await
        .unwrap();

    let unknown = app
        .clone()
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "nobody@test.com", "password": "anything" }),
        ))
        .await
        .unwrap();
    let wrong = app
        .oneshot(post_json(
            "/api/auth/login",
            json!({ "email": "alice@test.com", "password": "Wrong123!" }),
        ))
        .await
        .unwrap();

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
    assert!(body_bytes(unknown).await.is_empty());
    assert!(body_bytes(wrong).await.is_empty());
}
