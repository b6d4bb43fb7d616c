//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use huddle_core::config::HuddleConfig;
use huddle_core::store::KvStore;
use huddle_session::ratelimit::CreateLimiter;
use huddle_session::registry::SessionRegistry;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are cheap to clone across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<HuddleConfig>,
    /// Live session actors over the backing store.
    pub registry: SessionRegistry,
    /// Shared per-IP session-creation limiter.
    pub create_limiter: CreateLimiter,
}

impl AppState {
    /// Wires the state from configuration and a backing store.
    ///
    /// Spawns the create-limiter task, so this must run inside a tokio
    /// runtime.
    pub fn new(config: Arc<HuddleConfig>, store: Arc<dyn KvStore>) -> Self {
        let create_limiter = CreateLimiter::spawn(
            config.rate_limit.create_per_hour,
            Duration::from_secs(3600),
            Duration::from_secs(config.rate_limit.sweep_interval_seconds),
        );
        let registry = SessionRegistry::new(store, Arc::clone(&config));
        Self {
            config,
            registry,
            create_limiter,
        }
    }
}
