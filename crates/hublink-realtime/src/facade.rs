//! Subscription façade: safe emit/on over the connection manager.
//!
//! Nothing here ever returns an error to the caller of [`SocketFacade::emit`]
//! or [`SocketFacade::on`]: a missing or disconnected handle degrades to a
//! logged no-op. Callers that need retry semantics watch
//! [`SocketFacade::connected`] and re-invoke.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use hublink_core::error::AppError;
use hublink_core::{AppResult, EventName};

use crate::channel::Subscription;
use crate::connection::{ConnectionHandle, ConnectionManager};

/// Cheaply clonable emit/subscribe API.
#[derive(Debug, Clone)]
pub struct SocketFacade {
    manager: Arc<ConnectionManager>,
}

impl SocketFacade {
    /// Wraps a manager.
    pub fn new(manager: Arc<ConnectionManager>) -> Self {
        Self { manager }
    }

    /// The wrapped manager.
    pub fn manager(&self) -> &Arc<ConnectionManager> {
        &self.manager
    }

    /// Mirrors the manager's connection state.
    pub fn connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// The live handle, if any.
    pub fn handle(&self) -> AppResult<Arc<ConnectionHandle>> {
        self.manager.get_socket()
    }

    /// Sends an event; failures are logged and dropped.
    ///
    /// Returns whether the event was handed to the transport.
    pub fn emit<E: EventName + ?Sized>(&self, event: &E, args: Vec<Value>) -> bool {
        match self.try_emit(event, args) {
            Ok(()) => true,
            Err(e) => {
                self.manager.metrics().emit_failed();
                error!(event = %event.event_name(), error = %e, "Failed to emit");
                false
            }
        }
    }

    /// Sends an event carrying one serialized argument.
    pub fn emit_payload<E, T>(&self, event: &E, payload: &T) -> bool
    where
        E: EventName + ?Sized,
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(payload) {
            Ok(value) => self.emit(event, vec![value]),
            Err(e) => {
                self.manager.metrics().emit_failed();
                error!(event = %event.event_name(), error = %e, "Failed to serialize payload");
                false
            }
        }
    }

    /// Sends an event and reports the failure instead of logging it.
    pub fn try_emit<E: EventName + ?Sized>(&self, event: &E, args: Vec<Value>) -> AppResult<()> {
        let name = event.event_name();
        let handle = self.manager.get_socket()?;
        handle
            .emit(name, args)
            .map_err(|e| AppError::emit(format!("Failed to emit {name}: {e}")))?;
        debug!(event = %name, "Event emitted");
        Ok(())
    }

    /// Registers a listener. Without a handle the failure is logged and the
    /// returned subscription is a no-op.
    pub fn on<E, F>(&self, event: &E, callback: F) -> Subscription
    where
        E: EventName + ?Sized,
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        let name = event.event_name();
        match self.manager.get_socket() {
            Ok(handle) => handle.on(name, Arc::new(callback)),
            Err(e) => {
                let err = AppError::subscribe(format!("Failed to subscribe to {name}: {e}"));
                error!(event = %name, error = %err, "Failed to subscribe");
                Subscription::noop()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use hublink_core::config::realtime::RealtimeConfig;
    use serde_json::json;

    use super::*;
    use crate::transport::MemoryTransport;

    #[test]
    fn test_without_handle_everything_degrades() {
        // No runtime: the handle cannot be built.
        let manager = Arc::new(ConnectionManager::new(
            RealtimeConfig::default(),
            Arc::new(MemoryTransport::new()),
        ));
        let facade = SocketFacade::new(manager.clone());

        assert!(!facade.connected());
        assert!(!facade.emit("save", vec![json!({"name": "topology"})]));
        assert!(facade.try_emit("save", vec![]).unwrap_err().is_not_initialized());

        let sub = facade.on("save", |_| {});
        assert!(!sub.is_active());
        assert!(!sub.release());
        assert_eq!(manager.metrics().snapshot().emit_failures, 1);
    }

    #[tokio::test]
    async fn test_emit_while_disconnected_is_logged_noop() {
        let config = RealtimeConfig {
            auto_connect: false,
            ..RealtimeConfig::default()
        };
        let manager = Arc::new(ConnectionManager::new(config, Arc::new(MemoryTransport::new())));
        let facade = SocketFacade::new(manager);

        assert!(!facade.connected());
        assert!(!facade.emit_payload("save", &json!({"id": 1})));
        let err = facade.try_emit("save", vec![]).unwrap_err();
        assert_eq!(err.kind, hublink_core::error::ErrorKind::Emit);
    }
}
