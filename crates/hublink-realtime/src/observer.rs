//! Connection-state observer.
//!
//! Mirrors the handle's connected flag into a `watch` channel for
//! presentation code. Mounting registers `connect`/`disconnect` listeners and
//! then reconciles with the current state, so a connection that came up
//! before the observer was attached is not missed. Dropping the observer
//! releases both listeners.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use crate::channel::SubscriptionSet;
use crate::connection::events;
use crate::facade::SocketFacade;

/// Live connected/disconnected flag bound to a façade.
#[derive(Debug)]
pub struct ConnectionObserver {
    facade: SocketFacade,
    state: Arc<watch::Sender<bool>>,
    subscriptions: SubscriptionSet,
}

impl ConnectionObserver {
    /// Registers the listeners and reconciles with the current state.
    pub fn mount(facade: &SocketFacade) -> Self {
        let (state, _) = watch::channel(facade.connected());
        let mut observer = Self {
            facade: facade.clone(),
            state: Arc::new(state),
            subscriptions: SubscriptionSet::new(),
        };
        observer.register();
        observer
    }

    /// Current value.
    pub fn connected(&self) -> bool {
        *self.state.borrow()
    }

    /// Receiver that sees every change.
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }

    /// Releases and re-registers the listeners, e.g. after the manager built
    /// a new handle.
    pub fn remount(&mut self) {
        self.subscriptions.release_all();
        self.register();
    }

    /// Number of listeners currently held.
    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn register(&mut self) {
        let on_connect = self.state.clone();
        self.subscriptions.push(self.facade.on(events::CONNECT, move |_| {
            on_connect.send_replace(true);
        }));

        let on_disconnect = self.state.clone();
        self.subscriptions
            .push(self.facade.on(events::DISCONNECT, move |_| {
                on_disconnect.send_replace(false);
            }));

        // Read under the channel's write lock: a connect or disconnect
        // listener firing meanwhile publishes after us, never before.
        let facade = &self.facade;
        let mut current = false;
        self.state.send_if_modified(|state| {
            current = facade.connected();
            let changed = *state != current;
            *state = current;
            changed
        });
        debug!(connected = current, "Connection observer mounted");
    }
}

#[cfg(test)]
mod tests {
    use hublink_core::config::realtime::RealtimeConfig;

    use super::*;
    use crate::connection::ConnectionManager;
    use crate::transport::MemoryTransport;

    #[tokio::test]
    async fn test_unmount_releases_listeners() {
        let config = RealtimeConfig {
            auto_connect: false,
            ..RealtimeConfig::default()
        };
        let manager = Arc::new(ConnectionManager::new(config, Arc::new(MemoryTransport::new())));
        let facade = SocketFacade::new(manager.clone());
        let handle = manager.get_socket().unwrap();

        let mut observer = ConnectionObserver::mount(&facade);
        assert!(!observer.connected());
        assert_eq!(handle.listener_count(events::CONNECT), 1);
        assert_eq!(handle.listener_count(events::DISCONNECT), 1);

        observer.remount();
        assert_eq!(handle.listener_count(events::CONNECT), 1);
        assert_eq!(observer.listener_count(), 2);

        drop(observer);
        assert_eq!(handle.listener_count(events::CONNECT), 0);
        assert_eq!(handle.listener_count(events::DISCONNECT), 0);
    }
}
