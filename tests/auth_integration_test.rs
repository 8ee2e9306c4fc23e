//! Login, bearer token validation and role gating.

mod common;

use axum::http::{Method, StatusCode};
use common::{into_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn login_returns_a_token_that_opens_protected_routes() {
    let app = TestApp::new().await;

    let (status, body) = into_json(
        app.request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({
                "email": "mecanico@taller.test",
                "password": "correct-horse-battery"
            })),
            None,
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["user"]["role"], "mecanico");
    let token = body["access_token"].as_str().expect("token").to_string();

    let response = app
        .request(Method::GET, "/api/v1/inventory", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let account = app
        .state
        .services
        .users
        .by_email("mecanico@taller.test")
        .await
        .unwrap()
        .expect("account exists");
    assert!(account.last_access.is_some(), "login stamps last access");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({
                "email": "admin@taller.test",
                "password": "not-the-password"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({
                "email": "nobody@taller.test",
                "password": "whatever-it-is"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_or_invalid_tokens_are_rejected() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/inventory", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/inventory", None, Some("invalid_token_here"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn roles_gate_each_resource() {
    let app = TestApp::new().await;

    let (status, _) = app
        .call(&app.customer, Method::GET, "/api/v1/inventory", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(&app.customer, Method::GET, "/api/v1/services", None)
        .await;
    assert_eq!(status, StatusCode::OK, "catalog is open to any signed-in user");

    let (status, _) = app
        .call(
            &app.mechanic,
            Method::POST,
            "/api/v1/inventory",
            Some(json!({
                "code": "MEC-001",
                "name": "Not allowed",
                "purchase_price": "1.00",
                "sale_price": "2.00"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "item creation is admin only");

    let (status, _) = app
        .call(&app.mechanic, Method::GET, "/api/v1/users", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(&app.mechanic, Method::GET, "/api/v1/statistics/summary", None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(&app.admin, Method::GET, "/api/v1/statistics/summary", None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_and_status_need_no_token() {
    let app = TestApp::new().await;

    let (status, body) = into_json(app.request(Method::GET, "/health", None, None).await).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, body) = into_json(app.request(Method::GET, "/status", None, None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["service"], "taller-api");
}
