//! Connection manager owning at most one live connection handle.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing::{debug, error, info};

use hublink_core::config::realtime::RealtimeConfig;
use hublink_core::error::AppError;
use hublink_core::AppResult;

use crate::metrics::RealtimeMetrics;
use crate::transport::{Transport, WebSocketTransport};

use super::handle::ConnectionHandle;
use super::reconnect::ReconnectPolicy;

/// Process-wide manager returned by [`ConnectionManager::get_instance`].
static INSTANCE: OnceLock<Arc<ConnectionManager>> = OnceLock::new();

/// Owns the single connection handle and its lifecycle.
///
/// Initialization is lazy and guarded: while one caller is constructing the
/// handle, concurrent callers return immediately instead of building a
/// second one. Construction failures are logged and leave the manager ready
/// for another attempt.
#[derive(Debug)]
pub struct ConnectionManager {
    /// Connection settings.
    config: RealtimeConfig,
    /// Transport handed to every handle.
    transport: Arc<dyn Transport>,
    /// Metrics shared with handles.
    metrics: Arc<RealtimeMetrics>,
    /// Handle slot and init guard.
    state: Mutex<ManagerState>,
}

#[derive(Debug, Default)]
struct ManagerState {
    /// The live handle, if any.
    handle: Option<Arc<ConnectionHandle>>,
    /// Set while a handle is being constructed.
    connecting: bool,
}

impl ConnectionManager {
    /// Returns the process-wide manager, constructing it (and opening its
    /// connection over WebSocket) on the first call. Later calls ignore
    /// `config`.
    pub fn get_instance(config: &RealtimeConfig) -> Arc<Self> {
        INSTANCE
            .get_or_init(|| {
                let transport = Arc::new(WebSocketTransport::from_config(config));
                Arc::new(Self::new(config.clone(), transport))
            })
            .clone()
    }

    /// Creates a manager and immediately attempts to open its connection.
    pub fn new(config: RealtimeConfig, transport: Arc<dyn Transport>) -> Self {
        let manager = Self::lazy(config, transport);
        manager.init();
        manager
    }

    /// Creates a manager without opening anything; the handle is built on
    /// the first [`init`](Self::init) or [`get_or_create`](Self::get_or_create).
    pub fn lazy(config: RealtimeConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            metrics: Arc::new(RealtimeMetrics::new()),
            state: Mutex::new(ManagerState::default()),
        }
    }

    /// Builds the handle unless one exists or another build is in flight.
    ///
    /// Returns whether a handle is available afterwards. Failures are logged,
    /// never returned.
    pub fn init(&self) -> bool {
        {
            let mut state = self.lock_state();
            if state.handle.is_some() {
                return true;
            }
            if state.connecting {
                debug!("Connection initialization already in progress");
                return false;
            }
            state.connecting = true;
        }

        let built = self.build_handle();

        let mut state = self.lock_state();
        state.connecting = false;
        match built {
            Ok(handle) => {
                info!(
                    conn_id = %handle.id,
                    url = %handle.url(),
                    auto_connect = self.config.auto_connect,
                    "Connection handle initialized"
                );
                state.handle = Some(handle);
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize connection");
                false
            }
        }
    }

    /// Initializes if needed and returns the handle.
    pub fn get_or_create(&self) -> AppResult<Arc<ConnectionHandle>> {
        self.init();
        self.get_socket()
    }

    /// Returns the live handle.
    pub fn get_socket(&self) -> AppResult<Arc<ConnectionHandle>> {
        self.lock_state()
            .handle
            .clone()
            .ok_or_else(|| AppError::not_initialized("Socket not initialized"))
    }

    /// Explicitly (re)starts the connection: initializes if needed and starts
    /// the driver if it is not running (e.g. after reconnection gave up).
    pub fn connect(&self) -> AppResult<Arc<ConnectionHandle>> {
        let handle = self.get_or_create()?;
        handle.connect()?;
        Ok(handle)
    }

    /// Whether a link is currently established. `false` without a handle.
    pub fn is_connected(&self) -> bool {
        self.lock_state()
            .handle
            .as_ref()
            .is_some_and(|h| h.is_connected())
    }

    /// Whether a handle is being constructed right now.
    pub fn is_connecting(&self) -> bool {
        self.lock_state().connecting
    }

    /// Closes and releases the handle. The next access builds a new one.
    pub fn disconnect(&self) {
        let handle = {
            let mut state = self.lock_state();
            state.connecting = false;
            state.handle.take()
        };

        if let Some(handle) = handle {
            handle.close();
            info!(conn_id = %handle.id, "Connection handle released");
        }
    }

    /// Connection settings.
    pub fn config(&self) -> &RealtimeConfig {
        &self.config
    }

    /// Shared metrics.
    pub fn metrics(&self) -> &Arc<RealtimeMetrics> {
        &self.metrics
    }

    fn build_handle(&self) -> AppResult<Arc<ConnectionHandle>> {
        let url = self.config.endpoint_url()?.to_string();

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            AppError::connection_init(format!("No async runtime available for {url}: {e}"))
        })?;

        let handle = ConnectionHandle::new(
            self.config.path.clone(),
            url,
            self.transport.clone(),
            ReconnectPolicy::from_config(&self.config),
            self.metrics.clone(),
            runtime,
        );

        if self.config.auto_connect {
            handle
                .connect()
                .map_err(|e| AppError::connection_init(e.message))?;
        }

        Ok(handle)
    }

    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_state().handle.take() {
            handle.close();
        }
    }
}
