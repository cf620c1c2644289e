//! Resolves pending notifications from server events.
//!
//! A binder holds a list of rules (event name plus resolver). Mounting
//! registers one façade listener per rule; each delivered event is mapped to
//! a [`Resolution`] and applied to the store with
//! [`NotificationStore::update`]. Mount the binder at application scope so a
//! notification stays resolvable after the view that created it is gone.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use hublink_core::EventName;

use crate::channel::{Subscription, SubscriptionSet};
use crate::facade::SocketFacade;

use super::store::NotificationStore;
use super::types::{Notification, NotificationStatus};

/// Default argument field carrying the notification id.
pub const DEFAULT_CORRELATION_KEY: &str = "notificationId";

/// Terminal state to apply to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub id: String,
    pub status: NotificationStatus,
    pub title: String,
    /// Replaces the body when set; otherwise the body is kept.
    pub body: Option<String>,
}

/// Maps event arguments to a resolution. `None` means the event did not
/// identify a notification.
pub type Resolver = Arc<dyn Fn(&[Value]) -> Option<Resolution> + Send + Sync>;

struct Rule {
    event: String,
    resolver: Resolver,
}

/// Binds server events to store updates.
pub struct NotificationBinder {
    facade: SocketFacade,
    store: Arc<NotificationStore>,
    correlation_key: String,
    rules: Vec<Rule>,
    subscriptions: SubscriptionSet,
    mounted: bool,
}

impl NotificationBinder {
    pub fn new(facade: SocketFacade, store: Arc<NotificationStore>) -> Self {
        Self {
            facade,
            store,
            correlation_key: DEFAULT_CORRELATION_KEY.to_string(),
            rules: Vec::new(),
            subscriptions: SubscriptionSet::new(),
            mounted: false,
        }
    }

    /// Field read by rules added afterwards with [`Self::bind_outcome`].
    pub fn correlation_key(mut self, key: impl Into<String>) -> Self {
        self.correlation_key = key.into();
        self
    }

    /// Adds a rule with a custom resolver. Registered immediately when the
    /// binder is already mounted.
    pub fn bind<E, F>(mut self, event: &E, resolver: F) -> Self
    where
        E: EventName + ?Sized,
        F: Fn(&[Value]) -> Option<Resolution> + Send + Sync + 'static,
    {
        let rule = Rule {
            event: event.event_name().to_string(),
            resolver: Arc::new(resolver),
        };
        if self.mounted {
            self.subscriptions
                .push(subscribe_rule(&self.facade, &self.store, &rule));
        }
        self.rules.push(rule);
        self
    }

    /// Adds a rule resolving to `status`.
    ///
    /// The first argument must be an object whose correlation field holds the
    /// id (string or number). Optional `title` and `body` string fields
    /// override `default_title` and the stored body.
    pub fn bind_outcome<E: EventName + ?Sized>(
        self,
        event: &E,
        status: NotificationStatus,
        default_title: impl Into<String>,
    ) -> Self {
        let key = self.correlation_key.clone();
        let default_title = default_title.into();
        self.bind(event, move |args| {
            let fields = args.first()?.as_object()?;
            let id = match fields.get(&key)? {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            let title = fields
                .get("title")
                .and_then(Value::as_str)
                .map_or_else(|| default_title.clone(), str::to_owned);
            let body = fields.get("body").and_then(Value::as_str).map(str::to_owned);
            Some(Resolution {
                id,
                status,
                title,
                body,
            })
        })
    }

    /// Registers every rule. No-op when already mounted.
    pub fn mount(&mut self) {
        if self.mounted {
            return;
        }
        for rule in &self.rules {
            self.subscriptions
                .push(subscribe_rule(&self.facade, &self.store, rule));
        }
        self.mounted = true;
        debug!(rules = self.rules.len(), "Notification binder mounted");
    }

    /// Releases every registration.
    pub fn unmount(&mut self) {
        let released = self.subscriptions.release_all();
        self.mounted = false;
        debug!(released, "Notification binder unmounted");
    }

    /// Re-registers every rule against the current handle.
    pub fn remount(&mut self) {
        self.unmount();
        self.mount();
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Number of active registrations.
    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Adds a pending notification, then emits the request that will resolve
    /// it. If the emit fails the notification stays pending. Returns whether
    /// the request was sent.
    pub fn track<E: EventName + ?Sized>(
        &self,
        notification: Notification,
        event: &E,
        args: Vec<Value>,
    ) -> bool {
        let id = notification.id.clone();
        self.store.add(notification);
        let sent = self.facade.emit(event, args);
        if !sent {
            warn!(id = %id, event = %event.event_name(), "Request not sent, notification left pending");
        }
        sent
    }

    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }
}

impl std::fmt::Debug for NotificationBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let events: Vec<&str> = self.rules.iter().map(|r| r.event.as_str()).collect();
        f.debug_struct("NotificationBinder")
            .field("correlation_key", &self.correlation_key)
            .field("events", &events)
            .field("mounted", &self.mounted)
            .finish()
    }
}

fn subscribe_rule(facade: &SocketFacade, store: &Arc<NotificationStore>, rule: &Rule) -> Subscription {
    let store = store.clone();
    let resolver = rule.resolver.clone();
    let event = rule.event.clone();
    facade.on(rule.event.as_str(), move |args| match resolver(args) {
        Some(resolution) => {
            let Resolution {
                id,
                status,
                title,
                body,
            } = resolution;
            if store.update(&id, status, title, body) {
                debug!(event = %event, id = %id, %status, "Notification resolved");
            } else {
                debug!(event = %event, id = %id, "No notification to resolve");
            }
        }
        None => warn!(event = %event, "Event does not identify a notification"),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn resolver_for(status: NotificationStatus) -> Resolver {
        let binder = NotificationBinder::new(dummy_facade(), NotificationStore::new())
            .correlation_key("requestId")
            .bind_outcome("done", status, "Done");
        binder.rules[0].resolver.clone()
    }

    fn dummy_facade() -> SocketFacade {
        use hublink_core::config::realtime::RealtimeConfig;

        use crate::connection::ConnectionManager;
        use crate::transport::MemoryTransport;

        // Built outside a runtime: no handle, every call degrades.
        SocketFacade::new(Arc::new(ConnectionManager::new(
            RealtimeConfig::default(),
            Arc::new(MemoryTransport::new()),
        )))
    }

    #[test]
    fn test_outcome_resolver_reads_correlation_key() {
        let resolve = resolver_for(NotificationStatus::Success);

        let resolution = resolve(&[json!({"requestId": "t1", "body": "42 rows"})]).unwrap();
        assert_eq!(resolution.id, "t1");
        assert_eq!(resolution.title, "Done");
        assert_eq!(resolution.body.as_deref(), Some("42 rows"));

        let numeric = resolve(&[json!({"requestId": 7, "title": "Saved"})]).unwrap();
        assert_eq!(numeric.id, "7");
        assert_eq!(numeric.title, "Saved");
        assert_eq!(numeric.body, None);
    }

    #[test]
    fn test_outcome_resolver_rejects_uncorrelated_events() {
        let resolve = resolver_for(NotificationStatus::Error);
        assert!(resolve(&[]).is_none());
        assert!(resolve(&[json!("t1")]).is_none());
        assert!(resolve(&[json!({"notificationId": "t1"})]).is_none());
        assert!(resolve(&[json!({"requestId": null})]).is_none());
    }

    #[test]
    fn test_track_without_connection_leaves_pending() {
        let store = NotificationStore::new();
        let mut binder = NotificationBinder::new(dummy_facade(), store.clone())
            .bind_outcome("save:done", NotificationStatus::Success, "Saved");
        binder.mount();
        // No handle: the façade hands back inert subscriptions.
        assert!(binder.is_mounted());

        let sent = binder.track(Notification::pending("t1", "Saving", ""), "save", vec![]);
        assert!(!sent);
        assert_eq!(store.get("t1").unwrap().status, NotificationStatus::Pending);
    }
}
