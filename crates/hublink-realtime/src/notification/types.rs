//! Notification record and status.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of the operation a notification tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Request sent, outcome unknown.
    Pending,
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
}

impl NotificationStatus {
    /// Whether the status is an outcome.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One client-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Caller-supplied id used for correlation.
    pub id: String,
    pub title: String,
    pub body: String,
    pub status: NotificationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        status: NotificationStatus,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            status,
            created_at: now,
            updated_at: now,
        }
    }

    /// A pending notification.
    pub fn pending(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(id, title, body, NotificationStatus::Pending)
    }

    /// Time-ordered unique id for callers without one of their own.
    pub fn generate_id() -> String {
        Uuid::now_v7().to_string()
    }
}
