//! Change broadcast configuration.

use serde::{Deserialize, Serialize};

/// Settings for the change notification broadcast channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Internal buffer size for broadcast channels. Slow subscribers that
    /// fall more than this many messages behind skip ahead to the latest
    /// snapshot.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
        }
    }
}

fn default_channel_buffer() -> usize {
    64
}
