#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use liftlog_db::{open_and_migrate, DbPool, DbRuntimeSettings};
use liftlog_server::gate::TOKEN_HEADER;
use liftlog_server::notify::ResetNotifier;
use liftlog_server::{app, AppState};
use serde_json::{json, Value};
use tempfile::NamedTempFile;
use tower::ServiceExt; // for oneshot

pub const PASSWORD: &str = "teszt123";

pub struct TestApp {
    pub app: Router,
    pub pool: DbPool,
    // Keeps the database file alive for the duration of the test.
    _db: NamedTempFile,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_notifier(ResetNotifier::disabled())
    }

    pub fn with_notifier(notifier: ResetNotifier) -> Self {
        // Using tempfile for shared DB across pool connections
        let db = NamedTempFile::new().unwrap();
        let (pool, _) =
            open_and_migrate(db.path().to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
        let state = AppState::new(pool.clone(), notifier, "nonexistent-client");
        Self {
            app: app(state),
            pool,
            _db: db,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.post_raw(uri, token, body.to_string()).await
    }

    pub async fn post_raw(
        &self,
        uri: &str,
        token: Option<&str>,
        body: impl Into<Body>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        self.send(builder.body(body.into()).unwrap()).await
    }

    /// Registers `username` from the web client and returns its token.
    pub async fn signup(&self, username: &str) -> String {
        let (status, body) = self
            .post(
                "/api/signup",
                None,
                json!({
                    "username": username,
                    "email": format!("{username}@teszt.com"),
                    "password": PASSWORD,
                    "location": "web",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "signup failed: {body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Registers `username` and grants it the admin flag.
    pub async fn signup_admin(&self, username: &str) -> String {
        let token = self.signup(username).await;
        self.pool
            .get()
            .unwrap()
            .execute(
                "UPDATE user SET is_admin = 1 WHERE username = ?1",
                [username],
            )
            .unwrap();
        token
    }
}

pub fn assert_rejected(status: StatusCode, body: &Value, expected: StatusCode, reason: &str) {
    assert_eq!(status, expected, "unexpected status, body: {body}");
    assert_eq!(body["success"], false);
    assert_eq!(body["reason"], reason);
}
