//! Rate limiting configuration.

use serde::{Deserialize, Serialize};

/// Rate limiting configuration.
///
/// Send and read windows are tracked per participant inside each session
/// actor; the create window is tracked per client IP by a shared limiter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Messages a participant may send per minute.
    #[serde(default = "default_send_per_minute")]
    pub send_per_minute: u32,
    /// Read calls a participant may make per minute.
    #[serde(default = "default_read_per_minute")]
    pub read_per_minute: u32,
    /// Sessions one IP may create per hour.
    #[serde(default = "default_create_per_hour")]
    pub create_per_hour: u32,
    /// Interval between idle-key sweeps of the shared create limiter.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            send_per_minute: default_send_per_minute(),
            read_per_minute: default_read_per_minute(),
            create_per_hour: default_create_per_hour(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

fn default_send_per_minute() -> u32 {
    30
}

fn default_read_per_minute() -> u32 {
    120
}

fn default_create_per_hour() -> u32 {
    10
}

fn default_sweep_interval() -> u64 {
    300
}
