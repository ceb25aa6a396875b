//! Bounded reconnection policy.
//!
//! A lost connection gets a fixed number of redial attempts with a fixed
//! delay between them; once the budget is spent the session ends. The
//! counter resets on every successful handshake so a long session with
//! occasional drops is not penalized for earlier recoveries.

use crate::config::ConnectionConfig;
use crate::defaults;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay: defaults::RECONNECT_DELAY,
            max_attempts: defaults::MAX_RECONNECT_ATTEMPTS,
        }
    }
}

impl ReconnectPolicy {
    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.reconnect_delay_ms),
            max_attempts: config.max_reconnect_attempts,
        }
    }

    /// Delay before attempt number `attempts_made + 1`, or None when the
    /// budget is exhausted. `max_attempts == 0` disables reconnection.
    pub fn next_delay(&self, attempts_made: u32) -> Option<Duration> {
        if attempts_made < self.max_attempts {
            Some(self.delay)
        } else {
            None
        }
    }
}
