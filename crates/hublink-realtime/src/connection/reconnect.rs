//! Reconnection policy.

use std::time::Duration;

use hublink_core::config::realtime::RealtimeConfig;

/// Bounded, fixed-delay reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Whether the driver reconnects at all.
    pub enabled: bool,
    /// Attempts after the initial connect (or after a drop) before giving up.
    pub max_attempts: u32,
    /// Delay before each attempt.
    pub delay: Duration,
}

impl ReconnectPolicy {
    /// Build the policy from configuration.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self {
            enabled: config.reconnection,
            max_attempts: config.reconnection_attempts,
            delay: Duration::from_millis(config.reconnection_delay_ms),
        }
    }

    /// A policy that never reconnects.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_attempts: 0,
            delay: Duration::ZERO,
        }
    }

    /// Whether another attempt may follow `attempts_made` failed ones.
    pub fn allows(&self, attempts_made: u32) -> bool {
        self.enabled && attempts_made < self.max_attempts
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&RealtimeConfig::default())
    }
}
