//! Integration tests for sliding expiry and storage teardown.

mod helpers;

use std::time::Duration;

use http::StatusCode;
use huddle_core::config::HuddleConfig;

#[tokio::test]
async fn test_idle_session_expires_and_is_purged() {
    let mut config = HuddleConfig::default();
    config.session.ttl_seconds = 1;
    config.session.expiry_grace_seconds = 0;
    let app = helpers::TestApp::with_config(config);

    let created = app.create_session("short-lived", "Alice").await;
    assert!(!app.store.is_empty());

    tokio::time::sleep(Duration::from_millis(2500)).await;

    // Storage namespace is gone.
    assert!(app.store.is_empty());

    let response = app
        .request(
            "GET",
            "/api/sessions/short-lived",
            &[("X-Session-Password", &created.session_password)],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.error_code(), "SESSION_NOT_FOUND");
}

#[tokio::test]
async fn test_activity_extends_session_lifetime() {
    let mut config = HuddleConfig::default();
    config.session.ttl_seconds = 2;
    config.session.expiry_grace_seconds = 0;
    let app = helpers::TestApp::with_config(config);

    let created = app.create_session("busy", "Alice").await;

    // Keep touching the session past the original deadline.
    for _ in 0..3 {
        tokio::time::sleep(Duration::from_millis(1000)).await;
        let response = app
            .request(
                "GET",
                "/api/sessions/busy",
                &[("X-Session-Password", &created.session_password)],
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
    }

    // 3s elapsed against a 2s TTL, kept alive by activity.
    let response = app
        .request(
            "GET",
            "/api/sessions/busy",
            &[("X-Session-Password", &created.session_password)],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_ended_session_storage_is_torn_down() {
    let mut config = HuddleConfig::default();
    config.session.end_grace_seconds = 0;
    let app = helpers::TestApp::with_config(config);

    let created = app.create_session("ending", "Alice").await;

    let response = app
        .request(
            "DELETE",
            "/api/sessions/ending",
            &[("X-Admin-Password", &created.admin_password)],
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(app.store.is_empty());

    // The id is reusable after teardown.
    app.create_session("ending", "Bob").await;
}
