//! Actor registry.
//!
//! One [`SessionActor`] per session id serializes all access to that
//! session: every request locks the actor's engine mutex, so engine code
//! never races with itself or with the expiry timer. Actors are created
//! lazily on first touch and removed by the expiry task after purge.
//!
//! Operations must resolve their engine through
//! [`SessionRegistry::engine`]: retirement happens while the engine lock
//! is held, so a guard obtained there is guaranteed to belong to the
//! actor currently registered for the id.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use huddle_core::config::HuddleConfig;
use huddle_core::store::KvStore;

use crate::engine::SessionEngine;
use crate::expiry::{deadline_channel, spawn_expiry_task};

/// One session's serialization point.
#[derive(Debug)]
pub struct SessionActor {
    /// The engine; lock it for the duration of one operation.
    pub engine: Arc<Mutex<SessionEngine>>,
}

/// Process-wide map of live session actors.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    store: Arc<dyn KvStore>,
    config: Arc<HuddleConfig>,
    actors: Arc<DashMap<String, Arc<SessionActor>>>,
}

impl SessionRegistry {
    /// Creates an empty registry over the given store.
    pub fn new(store: Arc<dyn KvStore>, config: Arc<HuddleConfig>) -> Self {
        Self {
            store,
            config,
            actors: Arc::new(DashMap::new()),
        }
    }

    /// Returns the actor for `session_id`, creating it (and its expiry
    /// timer task) on first touch.
    ///
    /// An actor existing says nothing about the session existing; the
    /// engine hydrates from storage and decides that itself.
    pub fn actor(&self, session_id: &str) -> Arc<SessionActor> {
        self.actors
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id = %session_id, "Spawning session actor");
                let (handle, rx) = deadline_channel();
                // A fresh actor starts with a provisional deadline so a
                // slot touched for a session that is never created gets
                // reclaimed: the timer fires, finds no record, purges
                // and unregisters. `create` replaces this deadline with
                // the real one. The one-second floor keeps the timer
                // from firing under the request that just allocated the
                // slot when the grace is configured to zero.
                let grace = self.config.session.expiry_grace_seconds.max(1) as i64;
                handle.arm(Utc::now() + chrono::Duration::seconds(grace));
                let engine = SessionEngine::new(
                    Arc::clone(&self.store),
                    session_id,
                    &self.config,
                    handle,
                );
                let actor = Arc::new(SessionActor {
                    engine: Arc::new(Mutex::new(engine)),
                });
                spawn_expiry_task(
                    session_id.to_string(),
                    rx,
                    Arc::downgrade(&actor),
                    self.clone(),
                );
                actor
            })
            .clone()
    }

    /// Locks the engine for `session_id` for one operation.
    ///
    /// If the actor is retired (purged and unregistered) while this call
    /// waits on the lock, the stale guard is discarded and resolution
    /// starts over with a fresh actor, so an operation never runs on an
    /// engine whose timer task has already exited.
    pub async fn engine(&self, session_id: &str) -> OwnedMutexGuard<SessionEngine> {
        loop {
            let actor = self.actor(session_id);
            let guard = Arc::clone(&actor.engine).lock_owned().await;
            // Retirement happens under this lock, so a membership check
            // made while holding it cannot go stale mid-operation.
            if self.is_current(session_id, &actor) {
                return guard;
            }
        }
    }

    /// Whether `actor` is the one currently registered for `session_id`.
    fn is_current(&self, session_id: &str, actor: &Arc<SessionActor>) -> bool {
        self.actors
            .get(session_id)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), actor))
    }

    /// Drops the actor for `session_id`. Its expiry task exits once the
    /// last strong reference is gone.
    pub fn remove(&self, session_id: &str) {
        if self.actors.remove(session_id).is_some() {
            debug!(session_id = %session_id, "Session actor removed");
        }
    }

    /// Number of live actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// Whether no actors are live.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use huddle_core::error::ErrorKind;
    use huddle_store::MemoryKvStore;

    fn registry_with(config: HuddleConfig) -> (SessionRegistry, Arc<MemoryKvStore>) {
        let store = Arc::new(MemoryKvStore::new());
        let registry = SessionRegistry::new(
            Arc::clone(&store) as Arc<dyn KvStore>,
            Arc::new(config),
        );
        (registry, store)
    }

    #[tokio::test]
    async fn test_actor_is_created_once_per_id() {
        let (registry, _store) = registry_with(HuddleConfig::default());
        let a = registry.actor("s1");
        let b = registry.actor("s1");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);

        registry.actor("s2");
        assert_eq!(registry.len(), 2);

        registry.remove("s1");
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_operations_flow_through_the_actor() {
        let (registry, _store) = registry_with(HuddleConfig::default());

        let created = {
            let mut engine = registry.engine("room").await;
            engine.create("Alice").await.unwrap()
        };

        // A second resolution of the same id sees the session.
        let mut engine = registry.engine("room").await;
        let info = engine.session_info(&created.session_password).await.unwrap();
        assert_eq!(info.participant_count, 1);
    }

    #[tokio::test]
    async fn test_expiry_task_purges_and_unregisters() {
        let mut config = HuddleConfig::default();
        config.session.ttl_seconds = 1;
        config.session.expiry_grace_seconds = 0;
        let (registry, store) = registry_with(config);

        {
            let mut engine = registry.engine("short").await;
            engine.create("Alice").await.unwrap();
        }
        assert!(!store.is_empty());

        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;

        assert!(store.is_empty());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_end_session_triggers_prompt_purge() {
        let mut config = HuddleConfig::default();
        config.session.end_grace_seconds = 0;
        let (registry, store) = registry_with(config);

        let created = {
            let mut engine = registry.engine("ending").await;
            engine.create("Alice").await.unwrap()
        };

        {
            let mut engine = registry.engine("ending").await;
            engine.end_session(&created.admin_password).await.unwrap();
        }

        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        assert!(store.is_empty());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_actors_for_uncreated_sessions_are_reclaimed() {
        let mut config = HuddleConfig::default();
        config.session.expiry_grace_seconds = 0;
        let (registry, store) = registry_with(config);

        // Requests against ids that are never created must not pin
        // actors in the registry forever.
        for i in 0..25 {
            let mut engine = registry.engine(&format!("ghost-{i}")).await;
            let err = engine.session_info("pw").await.unwrap_err();
            assert_eq!(err.kind, ErrorKind::SessionNotFound);
        }
        assert_eq!(registry.len(), 25);

        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;

        assert!(registry.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_engine_resolution_skips_retired_actors() {
        let (registry, _store) = registry_with(HuddleConfig::default());

        let stale = registry.actor("room");
        registry.remove("room");

        // Resolution after retirement yields a fresh actor, never the
        // one whose timer task is gone.
        drop(registry.engine("room").await);
        let current = registry.actor("room");
        assert!(!Arc::ptr_eq(&stale, &current));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_recreated_session_id_keeps_a_live_timer() {
        let mut config = HuddleConfig::default();
        config.session.ttl_seconds = 1;
        config.session.expiry_grace_seconds = 0;
        config.session.end_grace_seconds = 0;
        let (registry, store) = registry_with(config);

        // First generation: create and end, letting the timer retire
        // the actor.
        let created = {
            let mut engine = registry.engine("room").await;
            engine.create("Alice").await.unwrap()
        };
        {
            let mut engine = registry.engine("room").await;
            engine.end_session(&created.admin_password).await.unwrap();
        }
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        assert!(registry.is_empty());

        // Second generation on the same id gets its own timer and is
        // purged on expiry like any other session.
        {
            let mut engine = registry.engine("room").await;
            engine.create("Bob").await.unwrap();
        }
        assert!(!store.is_empty());

        tokio::time::sleep(std::time::Duration::from_millis(2500)).await;
        assert!(store.is_empty());
        assert!(registry.is_empty());
    }
}
