//! WebSocket transport over `tokio-tungstenite`.
//!
//! Each link runs a writer task (outbound channel → text frames) and a reader
//! task (text frames → inbound channel). The reader owns the inbound sender,
//! so the link closes as soon as the socket does.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};

use hublink_core::config::realtime::RealtimeConfig;
use hublink_core::error::{AppError, ErrorKind};
use hublink_core::AppResult;

use crate::message::{serializer, WireMessage};

use super::{Transport, TransportLink};

/// Transport that speaks JSON text frames over a WebSocket.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    /// Per-direction channel buffer.
    buffer_size: usize,
    /// Upper bound for the handshake.
    connect_timeout: Duration,
}

impl WebSocketTransport {
    /// Create a transport with explicit limits.
    pub fn new(buffer_size: usize, connect_timeout: Duration) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            connect_timeout,
        }
    }

    /// Create a transport from the realtime configuration.
    pub fn from_config(config: &RealtimeConfig) -> Self {
        Self::new(
            config.outbound_buffer_size,
            Duration::from_secs(config.connect_timeout_seconds),
        )
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, url: &str) -> AppResult<TransportLink> {
        let (ws, _response) = tokio::time::timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| {
                AppError::transport(format!(
                    "Connecting to {url} timed out after {}s",
                    self.connect_timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Transport,
                    format!("WebSocket handshake with {url} failed: {e}"),
                    e,
                )
            })?;

        debug!(url = %url, "WebSocket handshake complete");

        let (mut sink, mut stream) = ws.split();
        let (out_tx, mut out_rx) = mpsc::channel::<WireMessage>(self.buffer_size);
        let (in_tx, in_rx) = mpsc::channel::<WireMessage>(self.buffer_size);

        let writer = tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let text = match serializer::encode(&msg) {
                    Ok(t) => t,
                    Err(e) => {
                        error!(event = %msg.event, error = %e, "Failed to encode outbound message");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text.into())).await {
                    warn!(error = %e, "WebSocket write failed");
                    return;
                }
            }
            // Outbound sender dropped: the client is closing the link.
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serializer::decode(text.as_str()) {
                        Ok(msg) => {
                            if in_tx.send(msg).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!(error = %e, "Dropping undecodable frame"),
                    },
                    Ok(Message::Close(frame)) => {
                        debug!(?frame, "Server closed the WebSocket");
                        break;
                    }
                    Ok(other) => trace!(kind = ?other, "Ignoring non-text frame"),
                    Err(e) => {
                        warn!(error = %e, "WebSocket read failed");
                        break;
                    }
                }
            }
            writer.abort();
        });

        Ok(TransportLink {
            outbound: out_tx,
            inbound: in_rx,
        })
    }
}
