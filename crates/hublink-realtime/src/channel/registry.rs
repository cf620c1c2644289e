//! Listener registry: event name to ordered list of callbacks.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{error, trace};

/// Callback invoked with the positional arguments of an event.
pub type EventCallback = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Identifier of one registered listener.
pub type ListenerId = u64;

struct Listener {
    id: ListenerId,
    callback: EventCallback,
}

/// Registry of listeners for one connection handle.
///
/// Listeners for the same event fire in registration order. Dispatch takes a
/// snapshot of the listener list before invoking anything, so a callback may
/// register or release listeners (including itself) while it runs.
pub struct EventRegistry {
    /// Event name → listeners in registration order.
    listeners: DashMap<String, Vec<Listener>>,
    /// Next listener id.
    next_id: AtomicU64,
}

impl EventRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a callback and returns its id.
    pub fn register(&self, event: &str, callback: EventCallback) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .entry(event.to_string())
            .or_default()
            .push(Listener { id, callback });
        trace!(event = %event, listener_id = id, "Listener registered");
        id
    }

    /// Removes one listener. Returns whether it was present.
    pub fn unregister(&self, event: &str, id: ListenerId) -> bool {
        let Some(mut listeners) = self.listeners.get_mut(event) else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|l| l.id != id);
        let removed = listeners.len() < before;
        if listeners.is_empty() {
            drop(listeners);
            self.listeners.remove_if(event, |_, v| v.is_empty());
        }
        removed
    }

    /// Invokes every listener for `event` in registration order.
    ///
    /// Returns how many listeners were invoked. A panicking listener is logged
    /// and does not prevent the remaining listeners from running.
    pub fn dispatch(&self, event: &str, args: &[Value]) -> usize {
        let snapshot: Vec<(ListenerId, EventCallback)> = match self.listeners.get(event) {
            Some(listeners) => listeners
                .iter()
                .map(|l| (l.id, l.callback.clone()))
                .collect(),
            None => return 0,
        };

        for (id, callback) in &snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(args))).is_err() {
                error!(event = %event, listener_id = id, "Event listener panicked");
            }
        }

        snapshot.len()
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map(|l| l.len()).unwrap_or(0)
    }

    /// Total number of listeners across all events.
    pub fn total_listeners(&self) -> usize {
        self.listeners.iter().map(|entry| entry.value().len()).sum()
    }

    /// Removes every listener.
    pub fn clear(&self) {
        self.listeners.clear();
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRegistry")
            .field("events", &self.listeners.len())
            .field("listeners", &self.total_listeners())
            .finish()
    }
}
