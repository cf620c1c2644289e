//! Transport seam between the connection handle and the network.
//!
//! A [`Transport`] opens one link per connect attempt. The link is a pair of
//! channels: the handle writes to `outbound` and reads from `inbound`. When
//! the remote side goes away the transport drops its end of `inbound`, which
//! the handle observes as a closed connection.

pub mod memory;
pub mod websocket;

use std::fmt;

use async_trait::async_trait;
use tokio::sync::mpsc;

use hublink_core::AppResult;

use crate::message::WireMessage;

pub use memory::{MemoryPeer, MemoryTransport};
pub use websocket::WebSocketTransport;

/// An open link produced by a successful connect.
#[derive(Debug)]
pub struct TransportLink {
    /// Messages to send to the server.
    pub outbound: mpsc::Sender<WireMessage>,
    /// Messages received from the server. Closes when the link drops.
    pub inbound: mpsc::Receiver<WireMessage>,
}

/// Opens links to the hub endpoint.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug + 'static {
    /// Attempt one connection to `url`.
    async fn connect(&self, url: &str) -> AppResult<TransportLink>;
}
