//! Session request engine.
//!
//! `SessionEngine` implements the session lifecycle state machine
//! (`nonexistent → active → ended|expired`) over a [`SessionState`]. All
//! operations except `create` require an active session; a missing,
//! ended, or expired session surfaces as `SESSION_NOT_FOUND`. The engine
//! is driven behind its actor's mutex, so methods take `&mut self` and
//! never need internal locking.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use huddle_core::config::HuddleConfig;
use huddle_core::config::session::SessionConfig;
use huddle_core::error::AppError;
use huddle_core::result::AppResult;
use huddle_core::store::KvStore;

use crate::credentials::{
    Credentials, generate_password, generate_token, new_participant_id, token_digest, token_matches,
};
use crate::expiry::{ExpiryHandle, ExpiryOutcome};
use crate::model::{Participant, SessionRecord};
use crate::ratelimit::SlidingWindow;
use crate::state::SessionState;

/// Window over which send/read quotas are counted.
const RATE_WINDOW: Duration = Duration::from_secs(60);

/// Result of a successful `create`.
///
/// Both passwords and the auth token are plaintext here — this is the
/// only time they are ever visible.
#[derive(Debug, Clone)]
pub struct SessionCreated {
    pub session_id: String,
    pub session_password: String,
    pub admin_password: String,
    pub participant_id: String,
    pub auth_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Result of a successful `join`.
#[derive(Debug, Clone)]
pub struct SessionJoined {
    pub participant_id: String,
    pub auth_token: String,
    pub participants: Vec<ParticipantInfo>,
}

/// Public view of one participant (no credential material).
#[derive(Debug, Clone)]
pub struct ParticipantInfo {
    pub id: String,
    pub display_name: String,
    pub joined_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub is_admin: bool,
}

/// Result of a successful `send_message`.
#[derive(Debug, Clone, Copy)]
pub struct MessageAccepted {
    pub id: u64,
    pub sent_at: DateTime<Utc>,
}

/// One message resolved for a reader.
#[derive(Debug, Clone)]
pub struct MessageView {
    pub id: u64,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Result of a successful `read_messages`.
#[derive(Debug, Clone)]
pub struct MessagesRead {
    pub messages: Vec<MessageView>,
    pub has_more: bool,
}

/// Aggregate session info.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub ended: bool,
    pub participant_count: usize,
    pub message_count: usize,
}

/// Validates a session identifier taken from the request path.
///
/// The id doubles as a storage key namespace, so the charset is locked
/// down to keep namespaces prefix-free.
pub fn validate_session_id(id: &str) -> AppResult<()> {
    let ok = !id.is_empty()
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(AppError::validation(
            "Session id must be 1-64 characters of [A-Za-z0-9_-]",
        ))
    }
}

/// Request handlers for one session.
#[derive(Debug)]
pub struct SessionEngine {
    state: SessionState,
    credentials: Credentials,
    config: SessionConfig,
    send_limiter: SlidingWindow,
    read_limiter: SlidingWindow,
    expiry: ExpiryHandle,
}

impl SessionEngine {
    /// Creates an engine for `session_id` over the given store.
    pub fn new(
        store: Arc<dyn KvStore>,
        session_id: impl Into<String>,
        config: &HuddleConfig,
        expiry: ExpiryHandle,
    ) -> Self {
        let session = config.session.clone();
        Self {
            state: SessionState::new(store, session_id, session.max_messages),
            credentials: Credentials::new(),
            send_limiter: SlidingWindow::new(config.rate_limit.send_per_minute, RATE_WINDOW),
            read_limiter: SlidingWindow::new(config.rate_limit.read_per_minute, RATE_WINDOW),
            config: session,
            expiry,
        }
    }

    /// The expiry deadline handle for this session.
    pub fn expiry_handle(&self) -> &ExpiryHandle {
        &self.expiry
    }

    // ── Operations ───────────────────────────────────────────────

    /// Creates the session. Only valid while no record exists.
    pub async fn create(&mut self, display_name: &str) -> AppResult<SessionCreated> {
        self.state.load_once().await?;
        if self.state.meta.is_some() {
            return Err(AppError::validation("Session already exists"));
        }

        let display_name = self.validate_display_name(display_name)?;
        let now = Utc::now();

        let session_password = generate_password();
        let admin_password = generate_password();
        let auth_token = generate_token();
        let participant_id = new_participant_id();

        let expires_at = now + self.ttl();
        let meta = SessionRecord {
            id: self.state.session_id().to_string(),
            password_hash: self.credentials.hash(&session_password)?,
            admin_password_hash: self.credentials.hash(&admin_password)?,
            created_at: now,
            created_by: participant_id.clone(),
            expires_at,
            last_activity: now,
            ended: false,
            next_seq: 1,
        };

        let creator = Participant {
            id: participant_id.clone(),
            display_name,
            joined_at: now,
            last_seen: now,
            is_admin: true,
            token_hash: token_digest(&auth_token),
        };

        self.state.meta = Some(meta);
        self.state.participants.insert(participant_id.clone(), creator);

        let index = self.state.index_entry()?;
        self.state.persist(vec![index]).await?;

        self.expiry.arm(expires_at + self.expiry_grace());

        info!(
            session_id = %self.state.session_id(),
            participant_id = %participant_id,
            "Session created"
        );

        Ok(SessionCreated {
            session_id: self.state.session_id().to_string(),
            session_password,
            admin_password,
            participant_id,
            auth_token,
            created_at: now,
            expires_at,
        })
    }

    /// Joins the session as a new non-admin participant.
    pub async fn join(
        &mut self,
        session_password: &str,
        display_name: &str,
    ) -> AppResult<SessionJoined> {
        self.require_active().await?;
        self.check_session_password(session_password)?;

        if self.state.participants.len() >= self.config.max_participants {
            return Err(AppError::session_full(format!(
                "Session already has {} participants",
                self.config.max_participants
            )));
        }

        let display_name = self.validate_display_name(display_name)?;
        let now = Utc::now();

        let auth_token = generate_token();
        let participant_id = new_participant_id();
        let participant = Participant {
            id: participant_id.clone(),
            display_name,
            joined_at: now,
            last_seen: now,
            is_admin: false,
            token_hash: token_digest(&auth_token),
        };
        self.state
            .participants
            .insert(participant_id.clone(), participant);

        self.touch(now);
        self.state.persist(vec![]).await?;

        info!(
            session_id = %self.state.session_id(),
            participant_id = %participant_id,
            count = self.state.participants.len(),
            "Participant joined"
        );

        Ok(SessionJoined {
            participant_id,
            auth_token,
            participants: self.roster(),
        })
    }

    /// Appends a message from `participant_id`.
    pub async fn send_message(
        &mut self,
        session_password: &str,
        auth_token: &str,
        participant_id: &str,
        content: String,
    ) -> AppResult<MessageAccepted> {
        self.require_active().await?;
        self.check_session_password(session_password)?;

        if content.chars().count() > self.config.max_message_length {
            return Err(AppError::validation(format!(
                "Message exceeds maximum length of {} characters",
                self.config.max_message_length
            )));
        }

        let decision = self.send_limiter.check(participant_id);
        if !decision.allowed {
            return Err(AppError::rate_limited(format!(
                "Send limit reached; retry in {}s",
                decision.reset_after.as_secs().max(1)
            )));
        }

        self.authenticate_participant(auth_token, participant_id)?;

        let now = Utc::now();
        let (message, evicted) = self
            .state
            .append_message(participant_id, content, now)
            .await?;
        if !evicted.is_empty() {
            self.state.purge_messages(&evicted).await?;
        }

        if let Some(p) = self.state.participants.get_mut(participant_id) {
            p.last_seen = now;
        }
        self.touch(now);

        let index = self.state.index_entry()?;
        self.state.persist(vec![index]).await?;

        debug!(
            session_id = %self.state.session_id(),
            participant_id = %participant_id,
            seq = message.seq,
            evicted = evicted.len(),
            "Message stored"
        );

        Ok(MessageAccepted {
            id: message.seq,
            sent_at: message.sent_at,
        })
    }

    /// Returns the next unread slice for `participant_id` and advances
    /// their stored cursor.
    pub async fn read_messages(
        &mut self,
        session_password: &str,
        auth_token: &str,
        participant_id: &str,
        limit: Option<usize>,
        after: Option<u64>,
    ) -> AppResult<MessagesRead> {
        self.require_active().await?;
        self.check_session_password(session_password)?;

        let decision = self.read_limiter.check(participant_id);
        if !decision.allowed {
            return Err(AppError::rate_limited(format!(
                "Read limit reached; retry in {}s",
                decision.reset_after.as_secs().max(1)
            )));
        }

        self.authenticate_participant(auth_token, participant_id)?;

        let limit = limit
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size);

        // Explicit `after` wins, else the stored cursor, else start-of-log.
        let cursor = after
            .or_else(|| self.state.cursors.get(participant_id).copied())
            .unwrap_or(0);

        let start = self.state.index.partition_point(|&seq| seq <= cursor);
        let selected: Vec<u64> = self.state.index[start..]
            .iter()
            .take(limit)
            .copied()
            .collect();
        let has_more = self.state.index.len() - start > selected.len();

        let mut messages = Vec::with_capacity(selected.len());
        for seq in &selected {
            match self.state.load_message(*seq).await? {
                Some(msg) => messages.push(msg),
                // Body lost independently of the index; skip, the next
                // hydration reconciles the index.
                None => debug!(
                    session_id = %self.state.session_id(),
                    seq,
                    "Message body missing during read"
                ),
            }
        }

        let views: Vec<MessageView> = messages
            .into_iter()
            .map(|msg| {
                let sender_name = self
                    .state
                    .participants
                    .get(&msg.sender)
                    .map(|p| p.display_name.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                MessageView {
                    id: msg.seq,
                    sender_id: msg.sender,
                    sender_name,
                    content: msg.content,
                    sent_at: msg.sent_at,
                }
            })
            .collect();

        let now = Utc::now();
        if let Some(&last) = selected.last() {
            let stored = self.state.cursors.get(participant_id).copied().unwrap_or(0);
            if last > stored {
                self.state.cursors.insert(participant_id.to_string(), last);
            }
        }
        if let Some(p) = self.state.participants.get_mut(participant_id) {
            p.last_seen = now;
        }
        self.touch(now);
        self.state.persist(vec![]).await?;

        Ok(MessagesRead {
            messages: views,
            has_more,
        })
    }

    /// Lists participants. Requires only the session password.
    pub async fn list_participants(
        &mut self,
        session_password: &str,
    ) -> AppResult<Vec<ParticipantInfo>> {
        self.require_active().await?;
        self.check_session_password(session_password)?;

        self.touch(Utc::now());
        self.state.persist(vec![]).await?;
        Ok(self.roster())
    }

    /// Returns aggregate session info. Requires only the session password.
    pub async fn session_info(&mut self, session_password: &str) -> AppResult<SessionSummary> {
        self.require_active().await?;
        self.check_session_password(session_password)?;

        self.touch(Utc::now());
        self.state.persist(vec![]).await?;

        let meta = self
            .state
            .meta
            .as_ref()
            .ok_or_else(|| AppError::internal("Session record vanished mid-operation"))?;
        Ok(SessionSummary {
            session_id: meta.id.clone(),
            created_at: meta.created_at,
            expires_at: meta.expires_at,
            last_activity: meta.last_activity,
            ended: meta.ended,
            participant_count: self.state.participants.len(),
            message_count: self.state.index.len(),
        })
    }

    /// Removes a participant.
    ///
    /// Self-removal needs only a valid auth token. Removing anyone else
    /// requires the requester to be an admin *and* present the correct
    /// admin password; every authorization failure surfaces as the same
    /// `ADMIN_REQUIRED` so callers learn nothing about admin status.
    pub async fn remove_participant(
        &mut self,
        session_password: &str,
        auth_token: &str,
        admin_password: Option<&str>,
        target_id: &str,
    ) -> AppResult<()> {
        self.require_active().await?;
        self.check_session_password(session_password)?;

        let requester_id = self
            .state
            .participants
            .values()
            .find(|p| token_matches(auth_token, &p.token_hash))
            .map(|p| p.id.clone())
            .ok_or_else(|| AppError::invalid_password("Invalid auth token"))?;

        if requester_id != target_id {
            let is_admin = self
                .state
                .participants
                .get(&requester_id)
                .is_some_and(|p| p.is_admin);
            let admin_ok = match (is_admin, admin_password) {
                (true, Some(pw)) => {
                    let meta = self
                        .state
                        .meta
                        .as_ref()
                        .ok_or_else(|| AppError::internal("Session record vanished mid-operation"))?;
                    self.credentials.verify(pw, &meta.admin_password_hash)?
                }
                _ => false,
            };
            if !admin_ok {
                return Err(AppError::admin_required(
                    "Admin credentials required to remove another participant",
                ));
            }
        }

        if !self.state.participants.contains_key(target_id) {
            return Err(AppError::participant_not_found(format!(
                "No participant {target_id} in session"
            )));
        }

        self.state.participants.remove(target_id);
        self.state.cursors.remove(target_id);
        self.touch(Utc::now());
        self.state.persist(vec![]).await?;

        info!(
            session_id = %self.state.session_id(),
            requester_id = %requester_id,
            target_id = %target_id,
            "Participant removed"
        );
        Ok(())
    }

    /// Ends the session. The session becomes unusable immediately;
    /// storage teardown is deferred to the shortened expiry timer.
    pub async fn end_session(&mut self, admin_password: &str) -> AppResult<()> {
        self.require_active().await?;

        let meta = self
            .state
            .meta
            .as_ref()
            .ok_or_else(|| AppError::internal("Session record vanished mid-operation"))?;
        if !self.credentials.verify(admin_password, &meta.admin_password_hash)? {
            return Err(AppError::admin_required("Invalid admin password"));
        }

        let now = Utc::now();
        if let Some(meta) = self.state.meta.as_mut() {
            meta.ended = true;
            meta.last_activity = now;
        }
        self.state.persist(vec![]).await?;

        self.expiry.arm(now + self.end_grace());

        info!(session_id = %self.state.session_id(), "Session ended");
        Ok(())
    }

    /// Timer-fire evaluation. Purges a missing, ended, or expired
    /// session; otherwise reports the deadline to re-arm for.
    pub async fn handle_expiry(&mut self, now: DateTime<Utc>) -> AppResult<ExpiryOutcome> {
        self.state.load_once().await?;

        match &self.state.meta {
            None => {
                // Already gone; purging an empty namespace is a no-op.
                self.state.purge_all().await?;
                Ok(ExpiryOutcome::Purged)
            }
            Some(meta) if meta.ended || now > meta.expires_at => {
                info!(
                    session_id = %self.state.session_id(),
                    ended = meta.ended,
                    "Purging session storage"
                );
                self.state.purge_all().await?;
                Ok(ExpiryOutcome::Purged)
            }
            Some(meta) => Ok(ExpiryOutcome::Rearmed(meta.expires_at + self.expiry_grace())),
        }
    }

    // ── Auth chain & helpers ─────────────────────────────────────

    async fn require_active(&mut self) -> AppResult<()> {
        self.state.load_once().await?;
        let active = match &self.state.meta {
            Some(meta) => !meta.ended && Utc::now() <= meta.expires_at,
            None => false,
        };
        if active {
            Ok(())
        } else {
            Err(AppError::session_not_found())
        }
    }

    fn check_session_password(&self, password: &str) -> AppResult<()> {
        let meta = self
            .state
            .meta
            .as_ref()
            .ok_or_else(AppError::session_not_found)?;
        if self.credentials.verify(password, &meta.password_hash)? {
            Ok(())
        } else {
            Err(AppError::invalid_password("Invalid session password"))
        }
    }

    fn authenticate_participant(&self, auth_token: &str, participant_id: &str) -> AppResult<()> {
        let participant = self
            .state
            .participants
            .get(participant_id)
            .ok_or_else(|| AppError::not_participant("Unknown participant"))?;
        if token_matches(auth_token, &participant.token_hash) {
            Ok(())
        } else {
            Err(AppError::invalid_password("Invalid auth token"))
        }
    }

    fn validate_display_name(&self, raw: &str) -> AppResult<String> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(AppError::validation("Display name must not be empty"));
        }
        if name.chars().count() > self.config.max_display_name_length {
            return Err(AppError::validation(format!(
                "Display name exceeds {} characters",
                self.config.max_display_name_length
            )));
        }
        Ok(name.to_string())
    }

    /// Sliding-expiry refresh: every authenticated operation counts as
    /// activity and pushes the deadline out. The physical timer is not
    /// re-armed; it re-evaluates at fire time.
    fn touch(&mut self, now: DateTime<Utc>) {
        let ttl = self.ttl();
        if let Some(meta) = self.state.meta.as_mut() {
            meta.last_activity = now;
            meta.expires_at = now + ttl;
        }
    }

    fn roster(&self) -> Vec<ParticipantInfo> {
        let mut roster: Vec<ParticipantInfo> = self
            .state
            .participants
            .values()
            .map(|p| ParticipantInfo {
                id: p.id.clone(),
                display_name: p.display_name.clone(),
                joined_at: p.joined_at,
                last_seen: p.last_seen,
                is_admin: p.is_admin,
            })
            .collect();
        roster.sort_by_key(|p| p.joined_at);
        roster
    }

    fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.ttl_seconds as i64)
    }

    fn expiry_grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.expiry_grace_seconds as i64)
    }

    fn end_grace(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.config.end_grace_seconds as i64)
    }
}
