//! Authoritative in-memory mirror of one session's durable data.
//!
//! `SessionState` hydrates lazily from the backing store on first touch
//! (one load per instance lifetime), is mutated in memory by the engine,
//! and writes back through [`persist`](SessionState::persist) after each
//! mutating operation. Message bodies live under their own keys so the
//! metadata write stays cheap; the ordering index is a plain list of live
//! sequence numbers.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use huddle_core::error::AppError;
use huddle_core::result::AppResult;
use huddle_core::store::KvStore;

use crate::model::{Message, Participant, SessionRecord};

/// Keys deleted per batch when purging evicted message bodies.
const PURGE_CHUNK: usize = 128;

/// In-memory state of one session plus its storage namespace.
#[derive(Debug)]
pub struct SessionState {
    store: Arc<dyn KvStore>,
    session_id: String,
    max_messages: usize,
    initialized: bool,
    /// Session record; `None` until created (or after purge).
    pub meta: Option<SessionRecord>,
    /// Participant id → participant.
    pub participants: BTreeMap<String, Participant>,
    /// Participant id → last-acknowledged message seq.
    pub cursors: BTreeMap<String, u64>,
    /// Live message seqs, ascending arrival order.
    pub index: Vec<u64>,
}

impl SessionState {
    /// Creates an unhydrated state for `session_id`.
    pub fn new(store: Arc<dyn KvStore>, session_id: impl Into<String>, max_messages: usize) -> Self {
        Self {
            store,
            session_id: session_id.into(),
            max_messages,
            initialized: false,
            meta: None,
            participants: BTreeMap::new(),
            cursors: BTreeMap::new(),
            index: Vec::new(),
        }
    }

    /// The session identifier this state mirrors.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn key(&self, suffix: &str) -> String {
        format!("sess:{}:{suffix}", self.session_id)
    }

    fn message_key(&self, seq: u64) -> String {
        self.key(&format!("msg:{seq}"))
    }

    /// Hydrates from the backing store once per instance lifetime.
    ///
    /// On load, the message index is reconciled against the actual stored
    /// bodies (entries whose body record is missing are dropped) and
    /// trimmed to the configured cap if a retention-policy change left
    /// excess behind. Either repair rewrites the index immediately.
    pub async fn load_once(&mut self) -> AppResult<()> {
        if self.initialized {
            return Ok(());
        }
        self.initialized = true;

        let Some(raw_meta) = self.store.get(&self.key("meta")).await? else {
            return Ok(());
        };
        self.meta = Some(serde_json::from_str(&raw_meta)?);

        if let Some(raw) = self.store.get(&self.key("participants")).await? {
            self.participants = serde_json::from_str(&raw)?;
        }
        if let Some(raw) = self.store.get(&self.key("cursors")).await? {
            self.cursors = serde_json::from_str(&raw)?;
        }

        let stored_index: Vec<u64> = match self.store.get(&self.key("msg:index")).await? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        // Index and bodies can drift independently; keep only entries
        // whose body record still exists.
        let mut live = Vec::with_capacity(stored_index.len());
        let mut dropped = 0usize;
        for seq in stored_index {
            if self.store.exists(&self.message_key(seq)).await? {
                live.push(seq);
            } else {
                dropped += 1;
            }
        }
        if dropped > 0 {
            debug!(
                session_id = %self.session_id,
                dropped,
                "Dropped stale message index entries on load"
            );
        }

        let mut evicted = Vec::new();
        if live.len() > self.max_messages {
            let excess = live.len() - self.max_messages;
            evicted = live.drain(..excess).collect();
            warn!(
                session_id = %self.session_id,
                trimmed = evicted.len(),
                cap = self.max_messages,
                "Stored message log exceeds cap; trimming oldest"
            );
        }

        self.index = live;

        if dropped > 0 || !evicted.is_empty() {
            self.purge_messages(&evicted).await?;
            self.store
                .put(&self.key("msg:index"), &serde_json::to_string(&self.index)?)
                .await?;
        }

        Ok(())
    }

    /// Writes session metadata, participants, and cursors (plus any
    /// explicit extra pairs) back to the store in one multi-key call.
    pub async fn persist(&self, extra: Vec<(String, String)>) -> AppResult<()> {
        let meta = self
            .meta
            .as_ref()
            .ok_or_else(|| AppError::internal("Persist called without a session record"))?;

        let mut pairs = vec![
            (self.key("meta"), serde_json::to_string(meta)?),
            (
                self.key("participants"),
                serde_json::to_string(&self.participants)?,
            ),
            (self.key("cursors"), serde_json::to_string(&self.cursors)?),
        ];
        pairs.extend(extra);

        self.store.put_many(pairs).await
    }

    /// Serialized index pair for inclusion in a `persist` call.
    pub fn index_entry(&self) -> AppResult<(String, String)> {
        Ok((self.key("msg:index"), serde_json::to_string(&self.index)?))
    }

    /// Appends a message, writing its body immediately and evicting the
    /// oldest overflow from the in-memory index.
    ///
    /// Returns the message and the evicted seqs; the caller purges the
    /// evicted bodies and persists the updated index.
    pub async fn append_message(
        &mut self,
        sender: &str,
        content: String,
        now: DateTime<Utc>,
    ) -> AppResult<(Message, Vec<u64>)> {
        let meta = self
            .meta
            .as_mut()
            .ok_or_else(|| AppError::internal("Append called without a session record"))?;

        let seq = meta.next_seq;
        meta.next_seq += 1;

        let message = Message {
            seq,
            sender: sender.to_string(),
            content,
            sent_at: now,
        };

        self.store
            .put(&self.message_key(seq), &serde_json::to_string(&message)?)
            .await?;
        self.index.push(seq);

        let evicted = if self.index.len() > self.max_messages {
            let excess = self.index.len() - self.max_messages;
            self.index.drain(..excess).collect()
        } else {
            Vec::new()
        };

        Ok((message, evicted))
    }

    /// Loads one message body. `None` if the record is gone.
    pub async fn load_message(&self, seq: u64) -> AppResult<Option<Message>> {
        match self.store.get(&self.message_key(seq)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Deletes message bodies in chunks, so no single store call has to
    /// swallow an unbounded key list.
    pub async fn purge_messages(&self, seqs: &[u64]) -> AppResult<()> {
        for chunk in seqs.chunks(PURGE_CHUNK) {
            let keys: Vec<String> = chunk.iter().map(|seq| self.message_key(*seq)).collect();
            self.store.delete_many(&keys).await?;
        }
        Ok(())
    }

    /// Destroys every key in this session's namespace and resets the
    /// in-memory mirror, so operations already waiting on the actor see
    /// a nonexistent session rather than stale state.
    pub async fn purge_all(&mut self) -> AppResult<u64> {
        let purged = self.store.purge_prefix(&self.key("")).await?;
        self.meta = None;
        self.participants.clear();
        self.cursors.clear();
        self.index.clear();
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_store::MemoryKvStore;

    fn store() -> Arc<dyn KvStore> {
        Arc::new(MemoryKvStore::new())
    }

    fn record(session_id: &str, now: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            id: session_id.to_string(),
            password_hash: "ph".to_string(),
            admin_password_hash: "aph".to_string(),
            created_at: now,
            created_by: "p1".to_string(),
            expires_at: now + chrono::Duration::hours(1),
            last_activity: now,
            ended: false,
            next_seq: 1,
        }
    }

    #[tokio::test]
    async fn test_load_once_without_record() {
        let mut state = SessionState::new(store(), "s1", 10);
        state.load_once().await.unwrap();
        assert!(state.meta.is_none());
    }

    #[tokio::test]
    async fn test_persist_then_rehydrate() {
        let store = store();
        let now = Utc::now();

        let mut state = SessionState::new(Arc::clone(&store), "s1", 10);
        state.load_once().await.unwrap();
        state.meta = Some(record("s1", now));
        state.cursors.insert("p1".to_string(), 3);
        state.persist(vec![]).await.unwrap();

        let mut fresh = SessionState::new(store, "s1", 10);
        fresh.load_once().await.unwrap();
        assert!(fresh.meta.is_some());
        assert_eq!(fresh.cursors.get("p1"), Some(&3));
    }

    #[tokio::test]
    async fn test_append_evicts_oldest_beyond_cap() {
        let store = store();
        let now = Utc::now();
        let mut state = SessionState::new(store, "s1", 3);
        state.load_once().await.unwrap();
        state.meta = Some(record("s1", now));

        let mut all_evicted = Vec::new();
        for i in 0..5 {
            let (_, evicted) = state
                .append_message("p1", format!("m{i}"), now)
                .await
                .unwrap();
            all_evicted.extend(evicted);
        }

        assert_eq!(state.index, vec![3, 4, 5]);
        assert_eq!(all_evicted, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_load_trims_excess_over_cap() {
        let store = store();
        let now = Utc::now();

        // Write 5 messages under a cap of 10 ...
        let mut state = SessionState::new(Arc::clone(&store), "s1", 10);
        state.load_once().await.unwrap();
        state.meta = Some(record("s1", now));
        for i in 0..5 {
            state
                .append_message("p1", format!("m{i}"), now)
                .await
                .unwrap();
        }
        let index = state.index_entry().unwrap();
        state.persist(vec![index]).await.unwrap();

        // ... then rehydrate with the cap lowered to 2.
        let mut fresh = SessionState::new(Arc::clone(&store), "s1", 2);
        fresh.load_once().await.unwrap();
        assert_eq!(fresh.index, vec![4, 5]);

        // Trimmed bodies are gone from the store as well.
        assert!(fresh.load_message(1).await.unwrap().is_none());
        assert!(fresh.load_message(4).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_load_drops_index_entries_with_missing_bodies() {
        let store = store();
        let now = Utc::now();

        let mut state = SessionState::new(Arc::clone(&store), "s1", 10);
        state.load_once().await.unwrap();
        state.meta = Some(record("s1", now));
        for i in 0..3 {
            state
                .append_message("p1", format!("m{i}"), now)
                .await
                .unwrap();
        }
        let index = state.index_entry().unwrap();
        state.persist(vec![index]).await.unwrap();

        // Simulate a lost body record.
        store.delete("sess:s1:msg:2").await.unwrap();

        let mut fresh = SessionState::new(store, "s1", 10);
        fresh.load_once().await.unwrap();
        assert_eq!(fresh.index, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_purge_all_resets_memory_and_store() {
        let store = store();
        let now = Utc::now();

        let mut state = SessionState::new(Arc::clone(&store), "s1", 10);
        state.load_once().await.unwrap();
        state.meta = Some(record("s1", now));
        state.append_message("p1", "hello".to_string(), now).await.unwrap();
        let index = state.index_entry().unwrap();
        state.persist(vec![index]).await.unwrap();

        let purged = state.purge_all().await.unwrap();
        assert!(purged >= 4);
        assert!(state.meta.is_none());
        assert!(state.index.is_empty());

        // Idempotent.
        assert_eq!(state.purge_all().await.unwrap(), 0);
    }
}
