//! Client-side rate limiter configuration.

use serde::{Deserialize, Serialize};

/// Sliding-window rate limiter configuration.
///
/// The limiter is advisory self-throttling local to one client; it is
/// not an enforcement boundary shared across clients or processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// Maximum admitted events per window. Must be greater than zero.
    #[serde(default = "default_max_events")]
    pub max_events: usize,
    /// Window length in milliseconds. Must be greater than zero.
    #[serde(default = "default_window_millis")]
    pub window_millis: u64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            max_events: default_max_events(),
            window_millis: default_window_millis(),
        }
    }
}

fn default_max_events() -> usize {
    10
}

fn default_window_millis() -> u64 {
    1000
}
