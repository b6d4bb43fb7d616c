//! Request extractors for credential headers and client identity.

pub mod auth;
pub mod client_ip;

pub use auth::{AdminPassword, AuthToken, MaybeAdminPassword, SessionPassword};
pub use client_ip::ClientIp;
