//! Shared test helpers for integration tests.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use huddle_core::config::HuddleConfig;
use huddle_core::store::KvStore;
use huddle_store::MemoryKvStore;

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Backing store, for asserting on persisted state
    pub store: Arc<MemoryKvStore>,
}

/// Credentials captured from a create response.
#[derive(Debug, Clone)]
pub struct CreatedSession {
    pub session_id: String,
    pub session_password: String,
    pub admin_password: String,
    pub participant_id: String,
    pub auth_token: String,
}

impl TestApp {
    /// Create a test application with default configuration.
    pub fn new() -> Self {
        Self::with_config(HuddleConfig::default())
    }

    /// Create a test application with the given configuration.
    ///
    /// Must run inside a tokio test (the app spawns background tasks).
    pub fn with_config(config: HuddleConfig) -> Self {
        let store = Arc::new(MemoryKvStore::new());
        let router = huddle_api::build_app(
            Arc::new(config),
            Arc::clone(&store) as Arc<dyn KvStore>,
        );
        Self { router, store }
    }

    /// Make an HTTP request to the test app.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", "application/json");

        for (name, value) in headers {
            req = req.header(*name, *value);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse { status, body }
    }

    /// Create a session and return its credentials.
    pub async fn create_session(&self, session_id: &str, display_name: &str) -> CreatedSession {
        let response = self
            .request(
                "POST",
                &format!("/api/sessions/{session_id}/create"),
                &[],
                Some(serde_json::json!({ "display_name": display_name })),
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Create failed: {:?}",
            response.body
        );

        CreatedSession {
            session_id: session_id.to_string(),
            session_password: str_field(&response.body, "session_password"),
            admin_password: str_field(&response.body, "admin_password"),
            participant_id: str_field(&response.body, "participant_id"),
            auth_token: str_field(&response.body, "auth_token"),
        }
    }

    /// Join a session and return `(participant_id, auth_token)`.
    pub async fn join(&self, created: &CreatedSession, display_name: &str) -> (String, String) {
        let response = self
            .request(
                "POST",
                &format!("/api/sessions/{}/join", created.session_id),
                &[("X-Session-Password", &created.session_password)],
                Some(serde_json::json!({ "display_name": display_name })),
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::CREATED,
            "Join failed: {:?}",
            response.body
        );

        (
            str_field(&response.body, "participant_id"),
            str_field(&response.body, "auth_token"),
        )
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
}

impl TestResponse {
    /// The `error` code from an error body.
    pub fn error_code(&self) -> &str {
        self.body
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }
}

fn str_field(body: &Value, field: &str) -> String {
    body.get(field)
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("No '{field}' in response: {body:?}"))
        .to_string()
}
