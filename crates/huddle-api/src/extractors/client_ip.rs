//! Client IP extraction for the session-creation rate limit.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

use crate::error::ApiError;

/// Best-effort client address, keyed into the create limiter.
///
/// Takes the first entry of `X-Forwarded-For` when present, otherwise
/// the peer address from [`ConnectInfo`], so direct deployments without
/// a proxy still get per-client keys. The header is spoofable without a
/// trusted proxy, which is acceptable for a best-effort abuse guard.
#[derive(Debug, Clone)]
pub struct ClientIp(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientIp {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = forwarded_for(parts)
            .or_else(|| peer_addr(parts))
            .unwrap_or_else(|| "unknown".to_string());
        Ok(ClientIp(ip))
    }
}

fn forwarded_for(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn peer_addr(parts: &Parts) -> Option<String> {
    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
}
