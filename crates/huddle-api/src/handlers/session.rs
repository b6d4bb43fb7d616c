//! Session lifecycle handlers: create, info, end.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use huddle_core::error::AppError;

use crate::dto::request::CreateSessionRequest;
use crate::dto::response::{SessionCreatedResponse, SessionInfoResponse};
use crate::error::ApiResult;
use huddle_session::engine::validate_session_id;

use crate::extractors::{AdminPassword, ClientIp, SessionPassword};
use crate::handlers::checked_engine;
use crate::state::AppState;

/// `POST /api/sessions/{session_id}/create`
pub async fn create_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    ClientIp(client_ip): ClientIp,
    Json(body): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionCreatedResponse>)> {
    validate_session_id(&session_id)?;

    let decision = state.create_limiter.check(&client_ip).await?;
    if !decision.allowed {
        return Err(AppError::rate_limited(format!(
            "Session creation limit reached; retry in {}s",
            decision.reset_after.as_secs().max(1)
        ))
        .into());
    }

    let mut engine = state.registry.engine(&session_id).await;
    let created = engine.create(&body.display_name).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// `GET /api/sessions/{session_id}`
pub async fn session_info(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    SessionPassword(password): SessionPassword,
) -> ApiResult<Json<SessionInfoResponse>> {
    let mut engine = checked_engine(&state, &session_id).await?;
    let summary = engine.session_info(&password).await?;
    Ok(Json(summary.into()))
}

/// `DELETE /api/sessions/{session_id}`
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    AdminPassword(admin_password): AdminPassword,
) -> ApiResult<StatusCode> {
    let mut engine = checked_engine(&state, &session_id).await?;
    engine.end_session(&admin_password).await?;
    Ok(StatusCode::NO_CONTENT)
}
