//! Per-session expiry scheduling.
//!
//! Each session actor owns one timer task. The engine moves the deadline
//! (create, end) through an [`ExpiryHandle`]; activity-driven extensions
//! of `expires_at` deliberately do not touch the timer — the handler
//! re-reads state at fire time and re-arms when the deadline moved. The
//! timer is always either re-armed or followed by a purge; otherwise a
//! session would never clean up.

use std::sync::Weak;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, error};

use crate::registry::{SessionActor, SessionRegistry};

/// Delay before retrying after a failed expiry evaluation.
const RETRY_DELAY_SECONDS: i64 = 60;

/// What the engine decided when the timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryOutcome {
    /// Storage was purged; the actor is done.
    Purged,
    /// Session is still live; fire again at the given deadline.
    Rearmed(DateTime<Utc>),
}

/// Sender half of a session's expiry deadline.
#[derive(Debug, Clone)]
pub struct ExpiryHandle {
    tx: watch::Sender<Option<DateTime<Utc>>>,
}

impl ExpiryHandle {
    /// Replaces the pending deadline. The timer task picks the new value
    /// up immediately, dropping any in-flight sleep.
    pub fn arm(&self, deadline: DateTime<Utc>) {
        self.tx.send_replace(Some(deadline));
    }
}

/// Creates an unarmed deadline channel.
pub fn deadline_channel() -> (ExpiryHandle, watch::Receiver<Option<DateTime<Utc>>>) {
    let (tx, rx) = watch::channel(None);
    (ExpiryHandle { tx }, rx)
}

/// Runs one session's expiry timer until the session is purged or the
/// actor disappears.
pub(crate) fn spawn_expiry_task(
    session_id: String,
    mut rx: watch::Receiver<Option<DateTime<Utc>>>,
    actor: Weak<SessionActor>,
    registry: SessionRegistry,
) {
    tokio::spawn(async move {
        loop {
            let deadline = *rx.borrow_and_update();
            let Some(when) = deadline else {
                // Unarmed; wait for the first deadline.
                if rx.changed().await.is_err() {
                    return;
                }
                continue;
            };

            let sleep_for = (when - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                    // Deadline replaced; restart the sleep.
                }
                _ = tokio::time::sleep(sleep_for) => {
                    let Some(actor) = actor.upgrade() else {
                        return;
                    };
                    let mut engine = actor.engine.lock().await;
                    match engine.handle_expiry(Utc::now()).await {
                        Ok(ExpiryOutcome::Purged) => {
                            // Unregister while still holding the engine
                            // lock; registry resolution checks
                            // membership under the same lock, so no
                            // waiter can proceed on this retired actor.
                            registry.remove(&session_id);
                            drop(engine);
                            debug!(session_id = %session_id, "Expiry timer done");
                            return;
                        }
                        Ok(ExpiryOutcome::Rearmed(next)) => {
                            engine.expiry_handle().arm(next);
                        }
                        Err(e) => {
                            error!(
                                session_id = %session_id,
                                error = %e,
                                "Expiry evaluation failed; retrying"
                            );
                            engine
                                .expiry_handle()
                                .arm(Utc::now() + chrono::Duration::seconds(RETRY_DELAY_SECONDS));
                        }
                    }
                }
            }
        }
    });
}
