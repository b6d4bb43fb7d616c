//! Credential-header extractors.
//!
//! All three auth tiers travel as plain headers: `X-Session-Password`
//! (session tier), `X-Auth-Token` (participant tier), `X-Admin-Password`
//! (admin tier). A missing required header is rejected with the same
//! error kind a wrong value would produce, so probes cannot distinguish
//! "absent" from "incorrect".

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use huddle_core::error::AppError;

use crate::error::ApiError;

const SESSION_PASSWORD_HEADER: &str = "x-session-password";
const AUTH_TOKEN_HEADER: &str = "x-auth-token";
const ADMIN_PASSWORD_HEADER: &str = "x-admin-password";

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// The `X-Session-Password` header. Required.
#[derive(Debug, Clone)]
pub struct SessionPassword(pub String);

impl<S: Send + Sync> FromRequestParts<S> for SessionPassword {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts, SESSION_PASSWORD_HEADER)
            .map(SessionPassword)
            .ok_or_else(|| {
                ApiError(AppError::invalid_password(
                    "Missing X-Session-Password header",
                ))
            })
    }
}

/// The `X-Auth-Token` header. Required.
#[derive(Debug, Clone)]
pub struct AuthToken(pub String);

impl<S: Send + Sync> FromRequestParts<S> for AuthToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts, AUTH_TOKEN_HEADER)
            .map(AuthToken)
            .ok_or_else(|| ApiError(AppError::invalid_password("Missing X-Auth-Token header")))
    }
}

/// The `X-Admin-Password` header. Required.
#[derive(Debug, Clone)]
pub struct AdminPassword(pub String);

impl<S: Send + Sync> FromRequestParts<S> for AdminPassword {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts, ADMIN_PASSWORD_HEADER)
            .map(AdminPassword)
            .ok_or_else(|| {
                ApiError(AppError::admin_required("Missing X-Admin-Password header"))
            })
    }
}

/// The `X-Admin-Password` header when it is optional (participant
/// removal: self-removal needs none, removing others needs it).
#[derive(Debug, Clone)]
pub struct MaybeAdminPassword(pub Option<String>);

impl<S: Send + Sync> FromRequestParts<S> for MaybeAdminPassword {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAdminPassword(header_value(
            parts,
            ADMIN_PASSWORD_HEADER,
        )))
    }
}
