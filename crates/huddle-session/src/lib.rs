//! # huddle-session
//!
//! The single-session core of the Huddle chat relay: session state with
//! its backing-store mirror, the request engine enforcing authentication
//! and capacity invariants, per-session expiry scheduling, sliding-window
//! rate limiting, and the actor registry that serializes access.

pub mod credentials;
pub mod engine;
pub mod expiry;
pub mod model;
pub mod ratelimit;
pub mod registry;
pub mod state;

pub use engine::SessionEngine;
pub use registry::{SessionActor, SessionRegistry};
