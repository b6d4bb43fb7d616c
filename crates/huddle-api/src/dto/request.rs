//! Request DTOs.
//!
//! Validation of the contents (name length, message size) is the
//! engine's job; the DTOs only shape the JSON.

use serde::Deserialize;

/// Body of `POST /api/sessions/{session_id}/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    /// Display name for the creating participant.
    pub display_name: String,
}

/// Body of `POST /api/sessions/{session_id}/join`.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinSessionRequest {
    /// Display name for the joining participant.
    pub display_name: String,
}

/// Body of `POST /api/sessions/{session_id}/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct SendMessageRequest {
    /// Sender's participant id.
    pub participant_id: String,
    /// Message content.
    pub content: String,
}

/// Query of `GET /api/sessions/{session_id}/messages`.
#[derive(Debug, Clone, Deserialize)]
pub struct ReadMessagesQuery {
    /// Reader's participant id.
    pub participant_id: String,
    /// Page size override, clamped to the configured maximum.
    pub limit: Option<usize>,
    /// Read after this message id instead of the stored cursor.
    pub after: Option<u64>,
}
