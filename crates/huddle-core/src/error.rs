//! Unified application error types for Huddle.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. The [`ErrorKind`] display form is
//! the machine-readable code returned on the wire.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// Input validation failed (malformed display name, oversized content).
    Validation,
    /// The session does not exist, has ended, or has expired.
    SessionNotFound,
    /// The session already holds the maximum number of participants.
    SessionFull,
    /// Session password or auth token is wrong or missing.
    InvalidPassword,
    /// An admin action was attempted without a valid admin credential.
    AdminRequired,
    /// An operation referenced a participant id that is not in the session.
    NotParticipant,
    /// The removal target participant does not exist.
    ParticipantNotFound,
    /// A rate limit was exceeded.
    RateLimited,
    /// A backing-store read or write failed.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An internal server error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "VALIDATION_ERROR"),
            Self::SessionNotFound => write!(f, "SESSION_NOT_FOUND"),
            Self::SessionFull => write!(f, "SESSION_FULL"),
            Self::InvalidPassword => write!(f, "INVALID_PASSWORD"),
            Self::AdminRequired => write!(f, "ADMIN_REQUIRED"),
            Self::NotParticipant => write!(f, "NOT_PARTICIPANT"),
            Self::ParticipantNotFound => write!(f, "PARTICIPANT_NOT_FOUND"),
            Self::RateLimited => write!(f, "RATE_LIMITED"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Internal => write!(f, "INTERNAL_ERROR"),
        }
    }
}

/// The unified application error used throughout Huddle.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the entire application boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a session-not-found error.
    pub fn session_not_found() -> Self {
        Self::new(ErrorKind::SessionNotFound, "Session not found")
    }

    /// Create a session-full error.
    pub fn session_full(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SessionFull, message)
    }

    /// Create an invalid-password error.
    pub fn invalid_password(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidPassword, message)
    }

    /// Create an admin-required error.
    pub fn admin_required(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AdminRequired, message)
    }

    /// Create a not-participant error.
    pub fn not_participant(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotParticipant, message)
    }

    /// Create a participant-not-found error.
    pub fn participant_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParticipantNotFound, message)
    }

    /// Create a rate-limited error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimited, message)
    }

    /// Create a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Storage, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
