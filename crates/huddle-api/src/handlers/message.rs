//! Message handlers: send and cursor-based read.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::dto::request::{ReadMessagesQuery, SendMessageRequest};
use crate::dto::response::{MessageAcceptedResponse, MessagesResponse};
use crate::error::ApiResult;
use crate::extractors::{AuthToken, SessionPassword};
use crate::handlers::checked_engine;
use crate::state::AppState;

/// `POST /api/sessions/{session_id}/messages`
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    SessionPassword(password): SessionPassword,
    AuthToken(token): AuthToken,
    Json(body): Json<SendMessageRequest>,
) -> ApiResult<(StatusCode, Json<MessageAcceptedResponse>)> {
    let mut engine = checked_engine(&state, &session_id).await?;
    let accepted = engine
        .send_message(&password, &token, &body.participant_id, body.content)
        .await?;
    Ok((StatusCode::CREATED, Json(accepted.into())))
}

/// `GET /api/sessions/{session_id}/messages`
pub async fn read_messages(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<ReadMessagesQuery>,
    SessionPassword(password): SessionPassword,
    AuthToken(token): AuthToken,
) -> ApiResult<Json<MessagesResponse>> {
    let mut engine = checked_engine(&state, &session_id).await?;
    let read = engine
        .read_messages(
            &password,
            &token,
            &query.participant_id,
            query.limit,
            query.after,
        )
        .await?;
    Ok(Json(read.into()))
}
