//! Application-scope wiring of the realtime layer.

use std::sync::Arc;

use tracing::info;

use hublink_core::config::AppConfig;
use hublink_core::config::notification::NotificationConfig;

use crate::connection::ConnectionManager;
use crate::facade::SocketFacade;
use crate::metrics::MetricsSnapshot;
use crate::notification::{ExpiryPolicy, NotificationBinder, NotificationStore};
use crate::observer::ConnectionObserver;
use crate::session::AuthSession;
use crate::transport::{Transport, WebSocketTransport};

/// Owns the connection manager, the notification store and the session, and
/// keeps the store bound to the session.
pub struct RealtimeClient {
    /// Connection manager.
    manager: Arc<ConnectionManager>,
    /// Safe emit/on API.
    facade: SocketFacade,
    /// Notifications, cleared at session end.
    store: Arc<NotificationStore>,
    /// Authentication signal.
    session: Arc<AuthSession>,
}

impl std::fmt::Debug for RealtimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeClient")
            .field("connected", &self.facade.connected())
            .field("notifications", &self.store.len())
            .finish()
    }
}

impl RealtimeClient {
    /// Creates a client over a custom transport.
    pub fn new(config: &AppConfig, transport: Arc<dyn Transport>) -> Self {
        let manager = Arc::new(ConnectionManager::new(config.realtime.clone(), transport));
        Self::with_manager(manager, &config.notifications)
    }

    /// Creates a client over WebSocket.
    pub fn connect(config: &AppConfig) -> Self {
        let transport = Arc::new(WebSocketTransport::from_config(&config.realtime));
        Self::new(config, transport)
    }

    /// Creates a client around an existing manager, e.g. the process-wide
    /// one from [`ConnectionManager::get_instance`].
    pub fn with_manager(manager: Arc<ConnectionManager>, notifications: &NotificationConfig) -> Self {
        let facade = SocketFacade::new(manager.clone());
        let store = NotificationStore::with_policy(ExpiryPolicy::from_config(notifications));
        let session = Arc::new(AuthSession::new());
        store.bind_session(&session);

        info!(server_url = %manager.config().server_url, path = %manager.config().path, "Realtime client initialized");

        Self {
            manager,
            facade,
            store,
            session,
        }
    }

    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    pub fn facade(&self) -> &SocketFacade {
        &self.facade
    }

    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    /// Mounts a connection-state observer on the current handle.
    pub fn observer(&self) -> ConnectionObserver {
        ConnectionObserver::mount(&self.facade)
    }

    /// An unmounted binder over this client's store. Add rules, then mount.
    pub fn binder(&self) -> NotificationBinder {
        NotificationBinder::new(self.facade.clone(), self.store.clone())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.manager.metrics().snapshot()
    }

    /// Closes the connection and waits for its driver to stop.
    pub async fn shutdown(&self) {
        info!("Shutting down realtime client");
        let handle = self.manager.get_socket().ok();
        self.manager.disconnect();
        if let Some(handle) = handle {
            handle.stopped().await;
        }
        info!("Realtime client shut down");
    }
}
