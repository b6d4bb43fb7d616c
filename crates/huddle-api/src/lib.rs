//! # huddle-api
//!
//! HTTP layer for the Huddle chat relay: request/response DTOs,
//! credential-header extractors, handlers, the router, and the server
//! runner. All domain decisions live in `huddle-session`; this crate
//! only translates between HTTP and the engine.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use state::AppState;
