//! Response DTOs, built from engine outcome types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use huddle_session::engine::{
    MessageAccepted, MessageView, MessagesRead, ParticipantInfo, SessionCreated, SessionJoined,
    SessionSummary,
};

/// Response of `POST /create`. The only response that ever carries
/// plaintext credentials.
#[derive(Debug, Clone, Serialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
    pub session_password: String,
    pub admin_password: String,
    pub participant_id: String,
    pub auth_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl From<SessionCreated> for SessionCreatedResponse {
    fn from(created: SessionCreated) -> Self {
        Self {
            session_id: created.session_id,
            session_password: created.session_password,
            admin_password: created.admin_password,
            participant_id: created.participant_id,
            auth_token: created.auth_token,
            created_at: created.created_at,
            expires_at: created.expires_at,
        }
    }
}

/// One participant in a roster response.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantResponse {
    pub id: String,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_admin: bool,
}

impl From<ParticipantInfo> for ParticipantResponse {
    fn from(info: ParticipantInfo) -> Self {
        Self {
            id: info.id,
            display_name: info.display_name,
            joined_at: info.joined_at,
            last_seen: info.last_seen,
            is_admin: info.is_admin,
        }
    }
}

/// Response of `POST /join`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionJoinedResponse {
    pub participant_id: String,
    pub auth_token: String,
    pub participants: Vec<ParticipantResponse>,
}

impl From<SessionJoined> for SessionJoinedResponse {
    fn from(joined: SessionJoined) -> Self {
        Self {
            participant_id: joined.participant_id,
            auth_token: joined.auth_token,
            participants: joined.participants.into_iter().map(Into::into).collect(),
        }
    }
}

/// Response of `GET /participants`.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantsResponse {
    pub participants: Vec<ParticipantResponse>,
}

/// Response of `POST /messages`.
#[derive(Debug, Clone, Serialize)]
pub struct MessageAcceptedResponse {
    pub id: u64,
    pub sent_at: DateTime<Utc>,
}

impl From<MessageAccepted> for MessageAcceptedResponse {
    fn from(accepted: MessageAccepted) -> Self {
        Self {
            id: accepted.id,
            sent_at: accepted.sent_at,
        }
    }
}

/// One message in a read response.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub id: u64,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

impl From<MessageView> for MessageResponse {
    fn from(view: MessageView) -> Self {
        Self {
            id: view.id,
            sender_id: view.sender_id,
            sender_name: view.sender_name,
            content: view.content,
            sent_at: view.sent_at,
        }
    }
}

/// Response of `GET /messages`.
#[derive(Debug, Clone, Serialize)]
pub struct MessagesResponse {
    pub messages: Vec<MessageResponse>,
    pub has_more: bool,
}

impl From<MessagesRead> for MessagesResponse {
    fn from(read: MessagesRead) -> Self {
        Self {
            messages: read.messages.into_iter().map(Into::into).collect(),
            has_more: read.has_more,
        }
    }
}

/// Response of `GET /` (session info).
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfoResponse {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub ended: bool,
    pub participant_count: usize,
    pub message_count: usize,
}

impl From<SessionSummary> for SessionInfoResponse {
    fn from(summary: SessionSummary) -> Self {
        Self {
            session_id: summary.session_id,
            created_at: summary.created_at,
            expires_at: summary.expires_at,
            last_activity: summary.last_activity,
            ended: summary.ended,
            participant_count: summary.participant_count,
            message_count: summary.message_count,
        }
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
