//! Route definitions for the Huddle HTTP API.
//!
//! Session routes live under `/api/sessions/{session_id}`; the session
//! id is part of every path because each session is its own namespace.

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/sessions/{session_id}",
            get(handlers::session::session_info).delete(handlers::session::end_session),
        )
        .route(
            "/api/sessions/{session_id}/create",
            post(handlers::session::create_session),
        )
        .route(
            "/api/sessions/{session_id}/join",
            post(handlers::participant::join_session),
        )
        .route(
            "/api/sessions/{session_id}/messages",
            post(handlers::message::send_message).get(handlers::message::read_messages),
        )
        .route(
            "/api/sessions/{session_id}/participants",
            get(handlers::participant::list_participants),
        )
        .route(
            "/api/sessions/{session_id}/participants/{participant_id}",
            delete(handlers::participant::remove_participant),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
