//! Realtime client metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Client-level metrics counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Successful transport connects
    pub connections_opened: AtomicU64,
    /// Connections that closed (either side)
    pub disconnects: AtomicU64,
    /// Reconnection attempts made by the driver
    pub reconnect_attempts: AtomicU64,
    /// Messages handed to the transport
    pub messages_sent: AtomicU64,
    /// Messages received from the transport
    pub messages_received: AtomicU64,
    /// Emits that failed locally
    pub emit_failures: AtomicU64,
    /// Listener invocations
    pub callbacks_dispatched: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn connection_closed(&self) {
        self.disconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reconnect_attempted(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn message_sent(&self) {
        self.messages_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn emit_failed(&self) {
        self.emit_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn callbacks_dispatched_count(&self, count: u64) {
        self.callbacks_dispatched.fetch_add(count, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            emit_failures: self.emit_failures.load(Ordering::Relaxed),
            callbacks_dispatched: self.callbacks_dispatched.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Successful transport connects
    pub connections_opened: u64,
    /// Connections that closed
    pub disconnects: u64,
    /// Reconnection attempts
    pub reconnect_attempts: u64,
    /// Messages sent
    pub messages_sent: u64,
    /// Messages received
    pub messages_received: u64,
    /// Local emit failures
    pub emit_failures: u64,
    /// Listener invocations
    pub callbacks_dispatched: u64,
}
