//! Unified error types for HubLink.
//!
//! Every failure in the realtime layer is expressed as an [`AppError`] so the
//! façade and manager boundaries can log and absorb them uniformly.

use std::fmt;
use thiserror::Error;

/// Error kind categorization used across the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// No connection handle exists (construction failed or was torn down).
    NotInitialized,
    /// The connection handle could not be constructed.
    ConnectionInit,
    /// A handle exists but is not currently connected.
    NotConnected,
    /// Forwarding an emitted event to the handle failed.
    Emit,
    /// Registering a listener on the handle failed.
    Subscribe,
    /// The underlying transport failed (connect refused, I/O, handshake).
    Transport,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// A configuration error occurred.
    Configuration,
    /// An authentication session error occurred.
    Session,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "NOT_INITIALIZED"),
            Self::ConnectionInit => write!(f, "CONNECTION_INIT"),
            Self::NotConnected => write!(f, "NOT_CONNECTED"),
            Self::Emit => write!(f, "EMIT"),
            Self::Subscribe => write!(f, "SUBSCRIBE"),
            Self::Transport => write!(f, "TRANSPORT"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Session => write!(f, "SESSION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// The unified error used throughout HubLink.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-initialized error.
    pub fn not_initialized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotInitialized, message)
    }

    /// Create a connection-init error.
    pub fn connection_init(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionInit, message)
    }

    /// Create a not-connected error.
    pub fn not_connected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotConnected, message)
    }

    /// Create an emit error.
    pub fn emit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Emit, message)
    }

    /// Create a subscribe error.
    pub fn subscribe(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Subscribe, message)
    }

    /// Create a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create a session error.
    pub fn session(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Session, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Whether this error means no handle is available at all.
    pub fn is_not_initialized(&self) -> bool {
        self.kind == ErrorKind::NotInitialized
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
