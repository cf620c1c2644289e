//! Shared helpers for realtime integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use hublink_core::config::AppConfig;
use hublink_realtime::transport::{MemoryPeer, MemoryTransport};
use hublink_realtime::{ConnectionHandle, ConnectionState, RealtimeClient};

/// Default configuration; the memory transport ignores the endpoint.
pub fn test_config() -> AppConfig {
    AppConfig::default()
}

/// Client over `transport` with default settings.
pub fn client(transport: &MemoryTransport) -> RealtimeClient {
    RealtimeClient::new(&test_config(), Arc::new(transport.clone()))
}

/// Awaits `fut`, failing the test after ten seconds.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(10), fut)
        .await
        .expect("timed out")
}

/// Waits until the handle's state satisfies `pred`.
pub async fn wait_for_state(handle: &ConnectionHandle, pred: impl FnMut(&ConnectionState) -> bool) {
    let mut rx = handle.watch_state();
    within(rx.wait_for(pred)).await.expect("handle dropped");
}

/// Accepts the next link and waits until the handle reports it connected.
pub async fn connected_peer(transport: &MemoryTransport, client: &RealtimeClient) -> MemoryPeer {
    let peer = within(transport.accept()).await.expect("transport dropped");
    let handle = client.manager().get_socket().expect("handle");
    wait_for_state(&handle, |s| s.is_connected()).await;
    peer
}

/// A listener that forwards every argument list into a channel.
pub fn forwarder() -> (
    impl Fn(&[Value]) + Send + Sync + 'static,
    mpsc::UnboundedReceiver<Vec<Value>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = move |args: &[Value]| {
        let _ = tx.send(args.to_vec());
    };
    (listener, rx)
}

/// Next forwarded argument list.
pub async fn next(rx: &mut mpsc::UnboundedReceiver<Vec<Value>>) -> Vec<Value> {
    within(rx.recv()).await.expect("listener dropped")
}
