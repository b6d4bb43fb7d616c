//! Liveness probe.

use axum::Json;

use crate::dto::response::HealthResponse;

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
