//! Transport-level event names.
//!
//! These are dispatched by the connection handle itself and are never
//! accepted from the server.

/// A link was established.
pub const CONNECT: &str = "connect";
/// An established link closed. Argument: the [`CloseReason`](super::CloseReason) string.
pub const DISCONNECT: &str = "disconnect";
/// A connect attempt failed. Argument: the error text.
pub const CONNECT_ERROR: &str = "connect_error";
/// Reconnection attempts are exhausted.
pub const RECONNECT_FAILED: &str = "reconnect_failed";

/// Whether `event` is reserved for the transport layer.
pub fn is_reserved(event: &str) -> bool {
    matches!(event, CONNECT | DISCONNECT | CONNECT_ERROR | RECONNECT_FAILED)
}
