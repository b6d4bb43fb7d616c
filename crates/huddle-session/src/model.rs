//! Durable entity records for one session.
//!
//! All four entity types are owned exclusively by the session's state
//! instance and vanish together when the session's namespace is purged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The session record. Exactly one per instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Stable session identifier (also the storage namespace).
    pub id: String,
    /// Argon2id digest of the session password.
    pub password_hash: String,
    /// Argon2id digest of the admin password.
    pub admin_password_hash: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Participant id of the creator (the sole initial admin).
    pub created_by: String,
    /// Sliding expiry deadline; pushed forward by every authenticated
    /// operation while the session is active.
    pub expires_at: DateTime<Utc>,
    /// Last authenticated activity.
    pub last_activity: DateTime<Utc>,
    /// Set by an explicit end; terminal.
    pub ended: bool,
    /// Next message sequence number to allocate. Starts at 1 and never
    /// decreases, so surviving message ids stay stable under eviction.
    pub next_seq: u64,
}

/// One authenticated member of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Participant id, unique within the session.
    pub id: String,
    /// Display name shown to other participants.
    pub display_name: String,
    /// Join time.
    pub joined_at: DateTime<Utc>,
    /// Last time this participant sent or read.
    pub last_seen: DateTime<Utc>,
    /// Whether this participant may remove others.
    pub is_admin: bool,
    /// SHA-256 hex digest of the participant's auth token. The plaintext
    /// token is returned once at join/create and never stored.
    pub token_hash: String,
}

/// One message in the append-only log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Arrival-ordered sequence number; doubles as the message id.
    pub seq: u64,
    /// Sender participant id.
    pub sender: String,
    /// Message content.
    pub content: String,
    /// Arrival time.
    pub sent_at: DateTime<Utc>,
}
