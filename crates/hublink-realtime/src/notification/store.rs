//! Observable notification collection.
//!
//! The collection is an `Arc<Vec<Notification>>` held in a `watch` channel.
//! Every effective mutation builds a new vector and publishes a new `Arc`, so
//! readers can compare pointers to detect change and a snapshot is never
//! mutated under them. No-op mutations publish nothing.

use std::sync::{Arc, Weak};

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::session::AuthSession;

use super::expiry::{self, ExpiryPolicy, TIMEOUT_BODY};
use super::types::{Notification, NotificationStatus};

/// Ordered collection of notifications; insertion order is display order.
#[derive(Debug)]
pub struct NotificationStore {
    items: watch::Sender<Arc<Vec<Notification>>>,
    policy: ExpiryPolicy,
    this: Weak<NotificationStore>,
}

impl NotificationStore {
    /// Creates an empty store without timers.
    pub fn new() -> Arc<Self> {
        Self::with_policy(ExpiryPolicy::disabled())
    }

    /// Creates an empty store with the given timers.
    pub fn with_policy(policy: ExpiryPolicy) -> Arc<Self> {
        let (items, _) = watch::channel(Arc::new(Vec::new()));
        Arc::new_cyclic(|this| Self {
            items,
            policy,
            this: this.clone(),
        })
    }

    /// Appends a notification. A duplicate id is kept as a separate entry.
    pub fn add(&self, notification: Notification) {
        let timeout = match (notification.status, self.policy.pending_timeout) {
            (NotificationStatus::Pending, Some(after)) => Some(after),
            _ => None,
        };
        let dismiss = match (notification.status.is_terminal(), self.policy.dismiss_after) {
            (true, Some(after)) => Some(after),
            _ => None,
        };
        let id = notification.id.clone();
        let created_at = notification.created_at;
        let updated_at = notification.updated_at;

        self.items.send_modify(|items| {
            if items.iter().any(|n| n.id == notification.id) {
                warn!(id = %notification.id, "Adding notification with duplicate id");
            }
            let mut next = Vec::with_capacity(items.len() + 1);
            next.extend(items.iter().cloned());
            next.push(notification);
            *items = Arc::new(next);
        });
        debug!(id = %id, "Notification added");

        if let Some(after) = timeout {
            expiry::schedule_timeout(self.this.clone(), id.clone(), created_at, after);
        }
        if let Some(after) = dismiss {
            expiry::schedule_dismiss(self.this.clone(), id, updated_at, after);
        }
    }

    /// Resolves every entry with `id` to a terminal status and sets its title;
    /// the body is replaced only when given. Returns whether anything matched.
    ///
    /// Updates never move an entry back to pending: a `Pending` status is
    /// rejected and nothing is published.
    pub fn update(
        &self,
        id: &str,
        status: NotificationStatus,
        title: impl Into<String>,
        body: Option<String>,
    ) -> bool {
        if !status.is_terminal() {
            warn!(id = %id, "Update to pending status rejected");
            return false;
        }
        let title = title.into();
        let now = Utc::now();
        let updated = self.replace(|items| {
            if !items.iter().any(|n| n.id == id) {
                return None;
            }
            let next = items
                .iter()
                .map(|n| {
                    if n.id != id {
                        return n.clone();
                    }
                    let mut n = n.clone();
                    n.status = status;
                    n.title = title.clone();
                    if let Some(body) = &body {
                        n.body = body.clone();
                    }
                    n.updated_at = now;
                    n
                })
                .collect();
            Some(next)
        });

        if !updated {
            debug!(id = %id, "Update for unknown notification ignored");
            return false;
        }
        self.schedule_dismiss(id, now);
        true
    }

    /// Removes every entry with `id`. Returns whether anything was removed.
    pub fn remove(&self, id: &str) -> bool {
        self.replace(|items| {
            if !items.iter().any(|n| n.id == id) {
                return None;
            }
            Some(items.iter().filter(|n| n.id != id).cloned().collect())
        })
    }

    /// Empties the collection. Returns the number of entries removed.
    pub fn clear(&self) -> usize {
        let mut removed = 0;
        self.replace(|items| {
            if items.is_empty() {
                return None;
            }
            removed = items.len();
            Some(Vec::new())
        });
        removed
    }

    /// Current collection.
    pub fn snapshot(&self) -> Arc<Vec<Notification>> {
        self.items.borrow().clone()
    }

    /// First entry with `id`.
    pub fn get(&self, id: &str) -> Option<Notification> {
        self.items.borrow().iter().find(|n| n.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Receiver that sees every published collection.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Notification>>> {
        self.items.subscribe()
    }

    /// Clears the store whenever a session of `session` ends.
    ///
    /// The clear runs inside the session transition, so it has finished before
    /// `logout` (or a replacing `login`) returns and before the next session
    /// can start. The hook holds the store weakly.
    pub fn bind_session(&self, session: &AuthSession) {
        let store = self.this.clone();
        session.on_session_end(move |epoch| {
            if let Some(store) = store.upgrade() {
                let cleared = store.clear();
                info!(epoch, cleared, "Session ended, notifications cleared");
            }
        });
    }

    /// Fails pending entries `(id, created_at)`.
    pub(crate) fn expire_pending(&self, id: &str, created_at: DateTime<Utc>) -> bool {
        let now = Utc::now();
        let expired = self.replace(|items| {
            let matches = |n: &Notification| {
                n.id == id && n.created_at == created_at && n.status == NotificationStatus::Pending
            };
            if !items.iter().any(|n| matches(n)) {
                return None;
            }
            let next = items
                .iter()
                .map(|n| {
                    let mut n = n.clone();
                    if matches(&n) {
                        n.status = NotificationStatus::Error;
                        n.body = TIMEOUT_BODY.to_string();
                        n.updated_at = now;
                    }
                    n
                })
                .collect();
            Some(next)
        });
        if expired {
            self.schedule_dismiss(id, now);
        }
        expired
    }

    /// Removes resolved entries `(id, updated_at)`.
    pub(crate) fn dismiss_resolved(&self, id: &str, updated_at: DateTime<Utc>) -> bool {
        self.replace(|items| {
            let matches = |n: &Notification| {
                n.id == id && n.updated_at == updated_at && n.status.is_terminal()
            };
            if !items.iter().any(|n| matches(n)) {
                return None;
            }
            Some(items.iter().filter(|n| !matches(*n)).cloned().collect())
        })
    }

    fn schedule_dismiss(&self, id: &str, updated_at: DateTime<Utc>) {
        if let Some(after) = self.policy.dismiss_after {
            expiry::schedule_dismiss(self.this.clone(), id.to_string(), updated_at, after);
        }
    }

    /// Publishes the collection built by `next`, unless it returns `None`.
    fn replace(&self, next: impl FnOnce(&[Notification]) -> Option<Vec<Notification>>) -> bool {
        self.items.send_if_modified(|items| {
            let built = next(items.as_slice());
            match built {
                Some(built) => {
                    *items = Arc::new(built);
                    true
                }
                None => false,
            }
        })
    }
}
