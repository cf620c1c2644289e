//! The single logical connection to the hub.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::runtime;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use hublink_core::error::AppError;
use hublink_core::AppResult;

use crate::channel::{EventCallback, EventRegistry, Subscription};
use crate::message::WireMessage;
use crate::metrics::RealtimeMetrics;
use crate::transport::Transport;

use super::driver;
use super::events;
use super::reconnect::ReconnectPolicy;
use super::state::{CloseReason, ConnectionState};

/// Unique connection identifier
pub type ConnectionId = Uuid;

/// Handle to the connection owned by a [`ConnectionManager`](super::ConnectionManager).
///
/// Owns the listener registry and the driver task. Listeners survive
/// reconnections of the same handle. Only the manager constructs or closes
/// handles; consumers read state and route emit/on through the façade.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Path the hub is mounted at
    endpoint_path: String,
    /// Full endpoint URL
    url: String,
    /// Current state
    state: watch::Sender<ConnectionState>,
    /// Sender into the live link, present only while connected
    outbound: Mutex<Option<mpsc::Sender<WireMessage>>>,
    /// Listener registry
    registry: Arc<EventRegistry>,
    /// Transport used for every connect attempt
    transport: Arc<dyn Transport>,
    /// Reconnection policy
    policy: ReconnectPolicy,
    /// Shared metrics
    metrics: Arc<RealtimeMetrics>,
    /// Cancelled when the handle is closed
    cancel: CancellationToken,
    /// Driver task, if one was started
    driver: Mutex<Option<JoinHandle<()>>>,
    /// Runtime the driver runs on
    runtime: runtime::Handle,
    /// When the handle was created
    created_at: DateTime<Utc>,
}

impl ConnectionHandle {
    pub(crate) fn new(
        endpoint_path: String,
        url: String,
        transport: Arc<dyn Transport>,
        policy: ReconnectPolicy,
        metrics: Arc<RealtimeMetrics>,
        runtime: runtime::Handle,
    ) -> Arc<Self> {
        let (state, _) = watch::channel(ConnectionState::Idle);
        Arc::new(Self {
            id: Uuid::new_v4(),
            endpoint_path,
            url,
            state,
            outbound: Mutex::new(None),
            registry: Arc::new(EventRegistry::new()),
            transport,
            policy,
            metrics,
            cancel: CancellationToken::new(),
            driver: Mutex::new(None),
            runtime,
            created_at: Utc::now(),
        })
    }

    /// Path the hub is mounted at.
    pub fn endpoint_path(&self) -> &str {
        &self.endpoint_path
    }

    /// Full endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// When the handle was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Whether a link is currently established.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Whether the handle was closed.
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Starts the driver unless it is already running.
    ///
    /// This is also the explicit way to reconnect after the reconnection
    /// attempts were exhausted.
    pub fn connect(self: &Arc<Self>) -> AppResult<()> {
        if self.is_closed() {
            return Err(AppError::not_initialized(format!(
                "Connection {} was closed",
                self.id
            )));
        }

        let mut task = lock(&self.driver);
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!(conn_id = %self.id, "Driver already running");
            return Ok(());
        }

        *task = Some(self.runtime.spawn(driver::run(self.clone())));
        info!(conn_id = %self.id, url = %self.url, "Connection driver started");
        Ok(())
    }

    /// Sends an event to the server.
    ///
    /// Fails without queueing when not connected or when the outbound buffer
    /// is full.
    pub fn emit(&self, event: &str, args: Vec<Value>) -> AppResult<()> {
        if events::is_reserved(event) {
            return Err(AppError::emit(format!("'{event}' is a reserved event name")));
        }

        let outbound = lock(&self.outbound);
        let Some(tx) = outbound.as_ref() else {
            return Err(AppError::not_connected(format!(
                "Cannot emit '{event}': not connected ({})",
                self.state()
            )));
        };

        match tx.try_send(WireMessage::new(event, args)) {
            Ok(()) => {
                self.metrics.message_sent();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(AppError::emit(format!(
                "Cannot emit '{event}': outbound buffer full"
            ))),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(AppError::not_connected(format!(
                "Cannot emit '{event}': link closed"
            ))),
        }
    }

    /// Registers a listener.
    pub fn on(&self, event: &str, callback: EventCallback) -> Subscription {
        let id = self.registry.register(event, callback);
        Subscription::new(&self.registry, event, id)
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry.listener_count(event)
    }

    /// Closes the handle for good. Listeners see a final `disconnect` if a
    /// link was established.
    pub fn close(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        lock(&self.outbound).take();
        self.set_state(ConnectionState::Disconnected);
        info!(conn_id = %self.id, "Connection closed by client");
    }

    /// Waits for the driver task to stop. Meant to follow [`close`](Self::close).
    pub async fn stopped(&self) {
        let task = lock(&self.driver).take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(conn_id = %self.id, error = %e, "Connection driver failed");
            }
        }
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn policy(&self) -> ReconnectPolicy {
        self.policy
    }

    pub(crate) fn metrics(&self) -> &RealtimeMetrics {
        &self.metrics
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub(crate) fn set_state(&self, state: ConnectionState) {
        let previous = self.state.send_replace(state);
        if previous != state {
            debug!(conn_id = %self.id, from = %previous, to = %state, "Connection state changed");
        }
    }

    /// Marks the driver as stopped and publishes its final state. Done under
    /// the driver lock so a concurrent [`connect`](Self::connect) that observes
    /// the final state can always start a new driver.
    pub(crate) fn finish(&self, state: ConnectionState) {
        let mut task = lock(&self.driver);
        task.take();
        self.set_state(state);
    }

    /// Installs a fresh link. Returns `false` if the handle was closed while
    /// the link was being opened.
    pub(crate) fn on_open(&self, outbound: mpsc::Sender<WireMessage>) -> bool {
        {
            let mut slot = lock(&self.outbound);
            if self.cancel.is_cancelled() {
                return false;
            }
            *slot = Some(outbound);
        }
        self.set_state(ConnectionState::Connected);
        self.metrics.connection_opened();
        info!(conn_id = %self.id, url = %self.url, "Connected");
        self.dispatch(events::CONNECT, &[]);
        true
    }

    /// Tears down the current link.
    pub(crate) fn on_close(&self, reason: CloseReason) {
        lock(&self.outbound).take();
        self.set_state(ConnectionState::Disconnected);
        self.metrics.connection_closed();
        match reason {
            CloseReason::ClientClosed => info!(conn_id = %self.id, %reason, "Disconnected"),
            CloseReason::TransportClosed => warn!(conn_id = %self.id, %reason, "Disconnected"),
        }
        self.dispatch(events::DISCONNECT, &[Value::String(reason.as_str().to_string())]);
    }

    /// Delivers one inbound server message to listeners.
    pub(crate) fn deliver(&self, msg: WireMessage) {
        self.metrics.message_received();
        if events::is_reserved(&msg.event) {
            warn!(conn_id = %self.id, event = %msg.event, "Ignoring reserved event from server");
            return;
        }
        self.dispatch(&msg.event, &msg.args);
    }

    pub(crate) fn dispatch(&self, event: &str, args: &[Value]) {
        let count = self.registry.dispatch(event, args);
        self.metrics.callbacks_dispatched_count(count as u64);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
