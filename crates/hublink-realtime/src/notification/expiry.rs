//! Optional timers for pending and resolved notifications.
//!
//! Both timers are off by default. When they fire they re-check the entry
//! (same id, same timestamp, expected status) so a timer never touches a
//! notification that was updated, removed, cleared, or re-added meanwhile.

use std::sync::Weak;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use hublink_core::config::notification::NotificationConfig;

use super::store::NotificationStore;

/// Body given to a pending notification that timed out.
pub const TIMEOUT_BODY: &str = "Operation timed out";

/// Timer settings for a [`NotificationStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryPolicy {
    /// Pending notifications older than this become errors.
    pub pending_timeout: Option<Duration>,
    /// Resolved notifications are removed after this delay.
    pub dismiss_after: Option<Duration>,
}

impl ExpiryPolicy {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            pending_timeout: config.pending_timeout_ms.map(Duration::from_millis),
            dismiss_after: config.dismiss_after_ms.map(Duration::from_millis),
        }
    }

    /// No timers.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.pending_timeout.is_some() || self.dismiss_after.is_some()
    }
}

/// Fails the entry `(id, created_at)` if still pending after `after`.
pub(crate) fn schedule_timeout(
    store: Weak<NotificationStore>,
    id: String,
    created_at: DateTime<Utc>,
    after: Duration,
) {
    spawn_timer(after, move || {
        if let Some(store) = store.upgrade() {
            if store.expire_pending(&id, created_at) {
                debug!(id = %id, "Pending notification timed out");
            }
        }
    });
}

/// Removes the entry `(id, updated_at)` if still resolved after `after`.
pub(crate) fn schedule_dismiss(
    store: Weak<NotificationStore>,
    id: String,
    updated_at: DateTime<Utc>,
    after: Duration,
) {
    spawn_timer(after, move || {
        if let Some(store) = store.upgrade() {
            if store.dismiss_resolved(&id, updated_at) {
                debug!(id = %id, "Resolved notification dismissed");
            }
        }
    });
}

fn spawn_timer(after: Duration, fire: impl FnOnce() + Send + 'static) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        debug!("No async runtime; notification timer skipped");
        return;
    };
    runtime.spawn(async move {
        tokio::time::sleep(after).await;
        fire();
    });
}
