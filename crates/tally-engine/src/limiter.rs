//! Sliding-window admission control for one acting client.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::time::Instant;

use tally_core::config::LimiterConfig;

/// Local sliding-window rate limiter.
///
/// Advisory self-throttling: state is private to one engine instance and
/// never shared across clients or processes, so this bounds how fast one
/// client can *attempt* mutations, not how many the system accepts
/// globally. One limiter is constructed per room session and handed to
/// the synchronization engine; there is no shared module-level instance.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum admitted events per window.
    max_events: usize,
    /// Window length.
    window: Duration,
    /// Admission timestamps, oldest first.
    stamps: VecDeque<Instant>,
}

impl RateLimiter {
    /// Create a limiter from configuration. `max_events` is clamped to at
    /// least one.
    pub fn new(config: &LimiterConfig) -> Self {
        Self {
            max_events: config.max_events.max(1),
            window: Duration::from_millis(config.window_millis.max(1)),
            stamps: VecDeque::new(),
        }
    }

    /// Try to admit one event.
    ///
    /// Evicts timestamps that have left the window, then admits the call
    /// (recording the current time) only if fewer than `max_events`
    /// remain. A rejected call has no side effect.
    pub fn try_consume(&mut self) -> bool {
        let now = Instant::now();
        self.evict(now);

        if self.stamps.len() >= self.max_events {
            return false;
        }
        self.stamps.push_back(now);
        true
    }

    /// Time until the next call can be admitted.
    ///
    /// Zero when under capacity, otherwise the time until the oldest
    /// recorded timestamp exits the window.
    pub fn remaining_cooldown(&self) -> Duration {
        if self.stamps.len() < self.max_events {
            return Duration::ZERO;
        }
        match self.stamps.front() {
            Some(oldest) => self.window.saturating_sub(oldest.elapsed()),
            None => Duration::ZERO,
        }
    }

    fn evict(&mut self, now: Instant) {
        while let Some(oldest) = self.stamps.front() {
            if now.duration_since(*oldest) >= self.window {
                self.stamps.pop_front();
            } else {
                break;
            }
        }
    }
}
