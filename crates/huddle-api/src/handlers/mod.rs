//! HTTP handlers, grouped by resource.

pub mod health;
pub mod message;
pub mod participant;
pub mod session;

use tokio::sync::OwnedMutexGuard;

use huddle_session::engine::{SessionEngine, validate_session_id};

use crate::error::ApiError;
use crate::state::AppState;

/// Validates the path session id and locks its engine.
///
/// The id check runs before the registry touch so malformed ids never
/// reach the storage key namespace. Resolution goes through the registry
/// so a concurrently retired actor is never handed out.
pub(crate) async fn checked_engine(
    state: &AppState,
    session_id: &str,
) -> Result<OwnedMutexGuard<SessionEngine>, ApiError> {
    validate_session_id(session_id)?;
    Ok(state.registry.engine(session_id).await)
}
