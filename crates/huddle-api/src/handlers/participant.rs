//! Participant handlers: join, roster, removal.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::dto::request::JoinSessionRequest;
use crate::dto::response::{ParticipantsResponse, SessionJoinedResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthToken, MaybeAdminPassword, SessionPassword};
use crate::handlers::checked_engine;
use crate::state::AppState;

/// `POST /api/sessions/{session_id}/join`
pub async fn join_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    SessionPassword(password): SessionPassword,
    Json(body): Json<JoinSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionJoinedResponse>)> {
    let mut engine = checked_engine(&state, &session_id).await?;
    let joined = engine.join(&password, &body.display_name).await?;
    Ok((StatusCode::CREATED, Json(joined.into())))
}

/// `GET /api/sessions/{session_id}/participants`
pub async fn list_participants(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    SessionPassword(password): SessionPassword,
) -> ApiResult<Json<ParticipantsResponse>> {
    let mut engine = checked_engine(&state, &session_id).await?;
    let roster = engine.list_participants(&password).await?;
    Ok(Json(ParticipantsResponse {
        participants: roster.into_iter().map(Into::into).collect(),
    }))
}

/// `DELETE /api/sessions/{session_id}/participants/{participant_id}`
pub async fn remove_participant(
    State(state): State<AppState>,
    Path((session_id, participant_id)): Path<(String, String)>,
    SessionPassword(password): SessionPassword,
    AuthToken(token): AuthToken,
    MaybeAdminPassword(admin_password): MaybeAdminPassword,
) -> ApiResult<StatusCode> {
    let mut engine = checked_engine(&state, &session_id).await?;
    engine
        .remove_participant(&password, &token, admin_password.as_deref(), &participant_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
