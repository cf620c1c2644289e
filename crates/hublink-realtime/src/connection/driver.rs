//! Per-handle driver task: connect, pump, reconnect.
//!
//! The driver is the only place listener callbacks run, so callbacks for one
//! event fire in registration order and events fire in delivery order.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::message::WireMessage;

use super::events;
use super::handle::ConnectionHandle;
use super::state::{CloseReason, ConnectionState};

/// Runs until the handle is closed or reconnection gives up.
pub(crate) async fn run(handle: Arc<ConnectionHandle>) {
    let policy = handle.policy();
    let cancel = handle.cancel_token().clone();
    let mut attempt: u32 = 0;

    handle.set_state(ConnectionState::Connecting);

    loop {
        let result = tokio::select! {
            _ = cancel.cancelled() => break,
            r = handle.transport().connect(handle.url()) => r,
        };

        match result {
            Ok(link) => {
                if !handle.on_open(link.outbound) {
                    break;
                }
                attempt = 0;
                let reason = pump(&handle, link.inbound, &cancel).await;
                handle.on_close(reason);
                if reason == CloseReason::ClientClosed {
                    break;
                }
            }
            Err(e) => {
                warn!(conn_id = %handle.id, attempt, error = %e, "Connect attempt failed");
                handle.dispatch(events::CONNECT_ERROR, &[Value::String(e.to_string())]);
            }
        }

        if !policy.allows(attempt) {
            if policy.enabled {
                warn!(
                    conn_id = %handle.id,
                    attempts = attempt,
                    "Reconnection attempts exhausted, giving up"
                );
                handle.dispatch(events::RECONNECT_FAILED, &[]);
                handle.finish(ConnectionState::Exhausted);
            } else {
                handle.finish(ConnectionState::Disconnected);
            }
            break;
        }

        attempt += 1;
        handle.set_state(ConnectionState::Reconnecting { attempt });
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(policy.delay) => {}
        }
        handle.metrics().reconnect_attempted();
        debug!(conn_id = %handle.id, attempt, "Reconnecting");
    }

    debug!(conn_id = %handle.id, state = %handle.state(), "Connection driver stopped");
}

async fn pump(
    handle: &ConnectionHandle,
    mut inbound: mpsc::Receiver<WireMessage>,
    cancel: &CancellationToken,
) -> CloseReason {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return CloseReason::ClientClosed,
            msg = inbound.recv() => match msg {
                Some(msg) => handle.deliver(msg),
                None => return CloseReason::TransportClosed,
            },
        }
    }
}
