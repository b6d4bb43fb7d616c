//! Session lifecycle and capacity configuration.

use serde::{Deserialize, Serialize};

/// Session lifecycle and capacity configuration.
///
/// The message log is a sliding window: once `max_messages` is reached,
/// the oldest message is evicted for every new one appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sliding session TTL in seconds. Every authenticated operation
    /// pushes `expires_at` forward by this much.
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    /// Slack added after `expires_at` before the expiry timer fires.
    #[serde(default = "default_expiry_grace")]
    pub expiry_grace_seconds: u64,
    /// Delay between an explicit end and storage teardown.
    #[serde(default = "default_end_grace")]
    pub end_grace_seconds: u64,
    /// Maximum participants per session.
    #[serde(default = "default_max_participants")]
    pub max_participants: usize,
    /// Maximum retained messages per session.
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
    /// Maximum message content length in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
    /// Maximum display name length in characters.
    #[serde(default = "default_max_display_name_length")]
    pub max_display_name_length: usize,
    /// Default page size for message reads.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Maximum page size for message reads.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl(),
            expiry_grace_seconds: default_expiry_grace(),
            end_grace_seconds: default_end_grace(),
            max_participants: default_max_participants(),
            max_messages: default_max_messages(),
            max_message_length: default_max_message_length(),
            max_display_name_length: default_max_display_name_length(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

fn default_ttl() -> u64 {
    3600
}

fn default_expiry_grace() -> u64 {
    60
}

fn default_end_grace() -> u64 {
    60
}

fn default_max_participants() -> usize {
    3
}

fn default_max_messages() -> usize {
    1000
}

fn default_max_message_length() -> usize {
    50_000
}

fn default_max_display_name_length() -> usize {
    64
}

fn default_page_size() -> usize {
    100
}

fn default_max_page_size() -> usize {
    500
}
