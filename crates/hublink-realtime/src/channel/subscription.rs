//! Subscription releasers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use tracing::trace;

use super::registry::{EventRegistry, ListenerId};

/// Releaser for one registered listener.
///
/// Dropping a `Subscription` does **not** release it; the owner calls
/// [`Subscription::release`] on teardown, or hands it to a
/// [`SubscriptionSet`] that releases on drop. Release is idempotent and only
/// ever removes this listener.
#[derive(Debug)]
#[must_use = "a listener stays registered until its subscription is released"]
pub struct Subscription {
    target: Option<Target>,
    released: AtomicBool,
}

#[derive(Debug)]
struct Target {
    registry: Weak<EventRegistry>,
    event: String,
    id: ListenerId,
}

impl Subscription {
    pub(crate) fn new(registry: &Arc<EventRegistry>, event: &str, id: ListenerId) -> Self {
        Self {
            target: Some(Target {
                registry: Arc::downgrade(registry),
                event: event.to_string(),
                id,
            }),
            released: AtomicBool::new(false),
        }
    }

    /// A subscription that was never registered. Releasing it does nothing.
    pub fn noop() -> Self {
        Self {
            target: None,
            released: AtomicBool::new(true),
        }
    }

    /// Removes the listener. Returns `true` only for the call that actually
    /// removed it.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::SeqCst) {
            return false;
        }
        let Some(target) = &self.target else {
            return false;
        };
        match target.registry.upgrade() {
            Some(registry) => {
                let removed = registry.unregister(&target.event, target.id);
                trace!(event = %target.event, listener_id = target.id, removed, "Subscription released");
                removed
            }
            None => false,
        }
    }

    /// Whether the listener may still fire.
    pub fn is_active(&self) -> bool {
        !self.released.load(Ordering::SeqCst)
            && self
                .target
                .as_ref()
                .is_some_and(|t| t.registry.strong_count() > 0)
    }

    /// Event this subscription listens to, if it was registered.
    pub fn event(&self) -> Option<&str> {
        self.target.as_ref().map(|t| t.event.as_str())
    }
}

/// Subscriptions owned by one consumer, released together on unmount.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a subscription.
    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Releases and forgets every subscription. Returns how many listeners
    /// were actually removed.
    pub fn release_all(&mut self) -> usize {
        self.subscriptions
            .drain(..)
            .filter(|s| s.release())
            .count()
    }

    /// Number of held subscriptions.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the set holds nothing.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use serde_json::Value;

    use super::*;

    fn counting(registry: &Arc<EventRegistry>, event: &str, hits: &Arc<AtomicUsize>) -> Subscription {
        let hits = hits.clone();
        let id = registry.register(
            event,
            Arc::new(move |_: &[Value]| {
                hits.fetch_add(1, Ordering::SeqCst);
            }),
        );
        Subscription::new(registry, event, id)
    }

    #[test]
    fn test_release_is_idempotent() {
        let registry = Arc::new(EventRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = counting(&registry, "save", &hits);
        let other = counting(&registry, "save", &hits);

        assert!(sub.is_active());
        assert!(sub.release());
        assert!(!sub.release());
        assert!(!sub.is_active());

        registry.dispatch("save", &[]);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(other.is_active());
    }

    #[test]
    fn test_release_after_registry_dropped() {
        let registry = Arc::new(EventRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));
        let sub = counting(&registry, "save", &hits);

        drop(registry);
        assert!(!sub.is_active());
        assert!(!sub.release());
    }

    #[test]
    fn test_noop_subscription() {
        let sub = Subscription::noop();
        assert!(!sub.is_active());
        assert!(!sub.release());
        assert_eq!(sub.event(), None);
    }

    #[test]
    fn test_set_releases_on_drop() {
        let registry = Arc::new(EventRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));

        {
            let mut set = SubscriptionSet::new();
            set.push(counting(&registry, "connect", &hits));
            set.push(counting(&registry, "disconnect", &hits));
            assert_eq!(set.len(), 2);
            assert_eq!(registry.total_listeners(), 2);
        }

        assert_eq!(registry.total_listeners(), 0);
        registry.dispatch("connect", &[]);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }
}
