//! In-process transport for tests and loopback use.
//!
//! Every successful connect produces a [`MemoryPeer`] that plays the server
//! side of the link. Reachability and scripted failures are controlled from
//! the test through [`MemoryTransport`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use hublink_core::error::AppError;
use hublink_core::AppResult;

use crate::message::WireMessage;

use super::{Transport, TransportLink};

/// Fake transport backed by in-memory channels.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    shared: Arc<MemoryShared>,
}

#[derive(Debug)]
struct MemoryShared {
    /// Whether connects succeed.
    reachable: AtomicBool,
    /// Connects to refuse before honouring `reachable` again.
    failures_remaining: AtomicU32,
    /// Total connect calls.
    attempts: AtomicU32,
    /// Channel buffer size per direction.
    buffer_size: usize,
    /// Server sides of accepted links.
    peers_tx: mpsc::UnboundedSender<MemoryPeer>,
    peers_rx: Mutex<mpsc::UnboundedReceiver<MemoryPeer>>,
}

impl MemoryTransport {
    /// Create a reachable transport.
    pub fn new() -> Self {
        Self::with_buffer(64)
    }

    /// Create a reachable transport with a custom channel size.
    pub fn with_buffer(buffer_size: usize) -> Self {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(MemoryShared {
                reachable: AtomicBool::new(true),
                failures_remaining: AtomicU32::new(0),
                attempts: AtomicU32::new(0),
                buffer_size: buffer_size.max(1),
                peers_tx,
                peers_rx: Mutex::new(peers_rx),
            }),
        }
    }

    /// Make every subsequent connect succeed or fail.
    pub fn set_reachable(&self, reachable: bool) {
        self.shared.reachable.store(reachable, Ordering::SeqCst);
    }

    /// Refuse the next `count` connects.
    pub fn fail_next(&self, count: u32) {
        self.shared.failures_remaining.store(count, Ordering::SeqCst);
    }

    /// Number of connect calls observed so far.
    pub fn connect_attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    /// Wait for the server side of the next accepted link.
    pub async fn accept(&self) -> Option<MemoryPeer> {
        self.shared.peers_rx.lock().await.recv().await
    }

    fn take_scripted_failure(&self) -> bool {
        self.shared
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self, url: &str) -> AppResult<TransportLink> {
        let attempt = self.shared.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if self.take_scripted_failure() || !self.shared.reachable.load(Ordering::SeqCst) {
            debug!(url = %url, attempt, "Memory transport refused connection");
            return Err(AppError::transport(format!("Connection refused: {url}")));
        }

        let (to_client, inbound) = mpsc::channel(self.shared.buffer_size);
        let (outbound, from_client) = mpsc::channel(self.shared.buffer_size);

        let peer = MemoryPeer {
            url: url.to_string(),
            to_client: Some(to_client),
            from_client,
        };
        self.shared
            .peers_tx
            .send(peer)
            .map_err(|_| AppError::internal("Memory transport peer queue closed"))?;

        debug!(url = %url, attempt, "Memory transport accepted connection");
        Ok(TransportLink { outbound, inbound })
    }
}

/// Server side of an in-memory link.
#[derive(Debug)]
pub struct MemoryPeer {
    /// URL the client connected to.
    pub url: String,
    to_client: Option<mpsc::Sender<WireMessage>>,
    from_client: mpsc::Receiver<WireMessage>,
}

impl MemoryPeer {
    /// Push an event to the client. Returns `false` once the link is gone.
    pub async fn push(&self, event: &str, args: Vec<Value>) -> bool {
        match &self.to_client {
            Some(tx) => tx.send(WireMessage::new(event, args)).await.is_ok(),
            None => false,
        }
    }

    /// Receive the next event the client emitted, or `None` once the client
    /// closed the link.
    pub async fn recv(&mut self) -> Option<WireMessage> {
        self.from_client.recv().await
    }

    /// Drop the server side, which the client sees as a transport close.
    pub fn close(&mut self) {
        self.to_client = None;
    }

    /// Whether the server side is still open.
    pub fn is_open(&self) -> bool {
        self.to_client.is_some()
    }
}
