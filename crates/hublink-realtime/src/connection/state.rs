//! Connection state machine values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Observable state of a connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// Constructed without auto-connect; nothing attempted yet.
    Idle,
    /// First connect attempt in flight.
    Connecting,
    /// Link established.
    Connected,
    /// Waiting for or performing reconnection attempt `attempt` (1-based).
    Reconnecting {
        /// Attempt number.
        attempt: u32,
    },
    /// Closed by the client, or dropped with reconnection disabled.
    Disconnected,
    /// Reconnection attempts used up; waits for an explicit connect.
    Exhausted,
}

impl ConnectionState {
    /// Whether a link is currently established.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Whether the driver has stopped and will not connect on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Exhausted)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// Why an established link closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The client closed the handle.
    ClientClosed,
    /// The server or network dropped the link.
    TransportClosed,
}

impl CloseReason {
    /// Reason string passed to `disconnect` listeners.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientClosed => "io client disconnect",
            Self::TransportClosed => "transport close",
        }
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
