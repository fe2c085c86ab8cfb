mod common;

use axum::http::StatusCode;
use common::{assert_rejected, TestApp, PASSWORD};
use liftlog_server::notify::ResetNotifier;
use serde_json::json;
use std::time::Duration;

const MISSING: &str = "Missing or invalid POST field(s)";

fn stored_reset_token(app: &TestApp) -> String {
    app.pool
        .get()
        .unwrap()
        .query_row("SELECT token FROM login_reset", [], |row| row.get(0))
        .unwrap()
}

#[tokio::test]
async fn full_reset_flow_changes_password() {
    let app = TestApp::new();
    let session = app.signup("lifter01").await;

    let (status, body) = app
        .post("/api/reset/generate", None, json!({ "user": "lifter01" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body, json!({ "success": true }));

    let token = stored_reset_token(&app);
    assert_eq!(token.len(), 32);

    let (status, _) = app
        .post("/api/reset/validate", None, json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post(
            "/api/reset",
            None,
            json!({ "token": token, "password": "uj-jelszo" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Single use.
    let (status, body) = app
        .post("/api/reset/validate", None, json!({ "token": token }))
        .await;
    assert_rejected(status, &body, StatusCode::BAD_REQUEST, MISSING);

    let (status, body) = app
        .post(
            "/api/login",
            None,
            json!({ "user": "lifter01", "password": PASSWORD, "location": "web" }),
        )
        .await;
    assert_rejected(
        status,
        &body,
        StatusCode::BAD_REQUEST,
        "Invalid username or password",
    );

    let (status, _) = app
        .post(
            "/api/login",
            None,
            json!({ "user": "lifter01", "password": "uj-jelszo", "location": "mobile" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    // Existing sessions survive a reset.
    assert_eq!(app.get("/api/user", Some(&session)).await.0, StatusCode::OK);
}

#[tokio::test]
async fn unknown_account_is_rejected() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/reset/generate", None, json!({ "user": "nobody99" }))
        .await;
    assert_rejected(status, &body, StatusCode::BAD_REQUEST, MISSING);
}

#[tokio::test]
async fn unknown_or_malformed_tokens_are_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/api/reset/validate", None, json!({ "token": "00ff00ff" }))
        .await;
    assert_rejected(status, &body, StatusCode::BAD_REQUEST, MISSING);

    let (status, body) = app
        .post("/api/reset/validate", None, json!({ "token": "NOT-HEX" }))
        .await;
    assert_rejected(status, &body, StatusCode::BAD_REQUEST, MISSING);

    let (status, body) = app
        .post(
            "/api/reset",
            None,
            json!({ "token": "00ff00ff", "password": "uj-jelszo" }),
        )
        .await;
    assert_rejected(status, &body, StatusCode::BAD_REQUEST, MISSING);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let app = TestApp::new();
    app.signup("lifter01").await;
    app.post("/api/reset/generate", None, json!({ "user": "lifter01" }))
        .await;
    let token = stored_reset_token(&app);

    app.pool
        .get()
        .unwrap()
        .execute("UPDATE login_reset SET created = created - 601", [])
        .unwrap();

    let (status, body) = app
        .post("/api/reset/validate", None, json!({ "token": token }))
        .await;
    assert_rejected(status, &body, StatusCode::BAD_REQUEST, MISSING);
}

#[tokio::test]
async fn failed_notification_keeps_stored_token() {
    let dead = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let notifier = ResetNotifier::new(Some(format!("http://{dead}/notify")), "shared-secret").unwrap();
    let app = TestApp::with_notifier(notifier);
    app.signup("lifter01").await;

    let (status, body) = app
        .post("/api/reset/generate", None, json!({ "user": "lifter01" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    // Give the detached delivery time to hash the secret and fail.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let token = stored_reset_token(&app);
    let (status, _) = app
        .post("/api/reset/validate", None, json!({ "token": token }))
        .await;
    assert_eq!(status, StatusCode::OK);
}
