//! Notification tracking configuration.

use serde::{Deserialize, Serialize};

/// Optional expiry policy for tracked notifications.
///
/// Both timers are off by default: a pending notification stays pending until
/// it is resolved, removed, or cleared at session end.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Mark a still-pending notification as failed after this many milliseconds.
    #[serde(default)]
    pub pending_timeout_ms: Option<u64>,
    /// Remove a resolved notification after this many milliseconds.
    #[serde(default)]
    pub dismiss_after_ms: Option<u64>,
}
