//! Sliding-window rate limiting.
//!
//! [`SlidingWindow`] counts events in the trailing interval by filtering
//! timestamps older than the window. Session actors hold private
//! instances for send and read quotas; that state lives and dies with
//! the actor, which is acceptable for a best-effort abuse guard.
//!
//! [`CreateLimiter`] wraps one shared window behind a single-writer task
//! so session creation (which has no per-session actor yet) gets a
//! consistent global count per client IP.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use huddle_core::error::AppError;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy)]
pub struct RateDecision {
    /// Whether the event is admitted.
    pub allowed: bool,
    /// Events left in the current window after this one.
    pub remaining: u32,
    /// Time until the window frees a slot. Zero when allowed.
    pub reset_after: Duration,
}

/// In-memory sliding-window counter keyed by string.
#[derive(Debug)]
pub struct SlidingWindow {
    limit: u32,
    window: Duration,
    hits: HashMap<String, VecDeque<Instant>>,
}

impl SlidingWindow {
    /// Creates a limiter admitting `limit` events per `window` per key.
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            hits: HashMap::new(),
        }
    }

    /// Records an event for `key` if the window has room.
    pub fn check(&mut self, key: &str) -> RateDecision {
        let now = Instant::now();
        let hits = self.hits.entry(key.to_string()).or_default();

        while let Some(front) = hits.front() {
            if now.duration_since(*front) >= self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if (hits.len() as u32) < self.limit {
            hits.push_back(now);
            RateDecision {
                allowed: true,
                remaining: self.limit - hits.len() as u32,
                reset_after: Duration::ZERO,
            }
        } else {
            let reset_after = hits
                .front()
                .map(|front| self.window.saturating_sub(now.duration_since(*front)))
                .unwrap_or(Duration::ZERO);
            RateDecision {
                allowed: false,
                remaining: 0,
                reset_after,
            }
        }
    }

    /// Drops keys whose every recorded event has aged out of the window.
    pub fn sweep(&mut self) {
        let now = Instant::now();
        let window = self.window;
        self.hits
            .retain(|_, hits| hits.iter().any(|t| now.duration_since(*t) < window));
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.hits.len()
    }
}

enum Command {
    Check {
        key: String,
        reply: oneshot::Sender<RateDecision>,
    },
}

/// Handle to the shared session-creation limiter.
///
/// All checks are funneled through one task that owns the window map, so
/// concurrent creates from the same IP observe a consistent count. The
/// state is process-local and lost on restart: approximate by design.
#[derive(Debug, Clone)]
pub struct CreateLimiter {
    tx: mpsc::Sender<Command>,
}

impl CreateLimiter {
    /// Spawns the limiter task and returns a cloneable handle.
    pub fn spawn(limit: u32, window: Duration, sweep_interval: Duration) -> Self {
        let (tx, mut rx) = mpsc::channel::<Command>(64);

        tokio::spawn(async move {
            let mut windows = SlidingWindow::new(limit, window);
            let mut sweep = tokio::time::interval(sweep_interval);
            sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    cmd = rx.recv() => match cmd {
                        Some(Command::Check { key, reply }) => {
                            let _ = reply.send(windows.check(&key));
                        }
                        None => break,
                    },
                    _ = sweep.tick() => {
                        windows.sweep();
                        debug!(tracked = windows.tracked_keys(), "Create limiter sweep");
                    }
                }
            }
        });

        Self { tx }
    }

    /// Checks whether `key` may create a session right now.
    pub async fn check(&self, key: &str) -> Result<RateDecision, AppError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Check {
                key: key.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| {
                warn!("Create limiter task is gone");
                AppError::internal("Rate limiter unavailable")
            })?;

        reply_rx
            .await
            .map_err(|_| AppError::internal("Rate limiter dropped the request"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_admits_up_to_limit() {
        let mut limiter = SlidingWindow::new(2, Duration::from_secs(60));
        assert!(limiter.check("p1").allowed);
        assert!(limiter.check("p1").allowed);
        let third = limiter.check("p1");
        assert!(!third.allowed);
        assert!(third.reset_after > Duration::ZERO);
    }

    #[test]
    fn test_keys_are_independent() {
        let mut limiter = SlidingWindow::new(1, Duration::from_secs(60));
        assert!(limiter.check("p1").allowed);
        assert!(limiter.check("p2").allowed);
        assert!(!limiter.check("p1").allowed);
    }

    #[test]
    fn test_window_slides() {
        let mut limiter = SlidingWindow::new(1, Duration::from_millis(20));
        assert!(limiter.check("p1").allowed);
        assert!(!limiter.check("p1").allowed);
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check("p1").allowed);
    }

    #[test]
    fn test_sweep_drops_idle_keys() {
        let mut limiter = SlidingWindow::new(5, Duration::from_millis(10));
        limiter.check("idle");
        std::thread::sleep(Duration::from_millis(20));
        limiter.sweep();
        assert_eq!(limiter.tracked_keys(), 0);
    }

    #[tokio::test]
    async fn test_create_limiter_counts_globally() {
        let limiter = CreateLimiter::spawn(2, Duration::from_secs(60), Duration::from_secs(300));
        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(!limiter.check("10.0.0.1").await.unwrap().allowed);
        assert!(limiter.check("10.0.0.2").await.unwrap().allowed);
    }
}
