//! Integration tests for the connection-state observer.

mod helpers;

use serde_json::json;

use hublink_realtime::connection::events;
use hublink_realtime::transport::MemoryTransport;

use helpers::{client, connected_peer, forwarder, next, within};

#[tokio::test]
async fn test_mount_after_connect_reconciles() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    let _peer = connected_peer(&transport, &client).await;

    let observer = client.observer();
    assert!(observer.connected());
}

#[tokio::test(start_paused = true)]
async fn test_observer_follows_transitions() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    let observer = client.observer();
    assert!(!observer.connected());
    let mut rx = observer.watch();

    let mut peer = within(transport.accept()).await.unwrap();
    within(rx.wait_for(|c| *c)).await.unwrap();

    peer.close();
    within(rx.wait_for(|c| !*c)).await.unwrap();
    assert!(!observer.connected());

    let _peer = within(transport.accept()).await.unwrap();
    within(rx.wait_for(|c| *c)).await.unwrap();
    assert!(observer.connected());
}

#[tokio::test]
async fn test_dropped_observer_stops_listening() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    let handle = client.manager().get_socket().unwrap();

    let observer = client.observer();
    assert_eq!(handle.listener_count(events::CONNECT), 1);
    assert_eq!(handle.listener_count(events::DISCONNECT), 1);
    let rx = observer.watch();
    drop(observer);
    assert_eq!(handle.listener_count(events::CONNECT), 0);
    assert_eq!(handle.listener_count(events::DISCONNECT), 0);

    // Sync on a later event: the dropped observer saw nothing.
    let (sync, mut sync_rx) = forwarder();
    let _sync = client.facade().on("sync", sync);
    let peer = connected_peer(&transport, &client).await;
    peer.push("sync", vec![json!(1)]).await;
    next(&mut sync_rx).await;
    assert!(!*rx.borrow());
}

#[tokio::test]
async fn test_remount_follows_new_handle() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    let mut observer = client.observer();
    let _first = connected_peer(&transport, &client).await;
    assert!(observer.connected());

    client.manager().disconnect();
    let handle = client.manager().connect().unwrap();
    observer.remount();
    assert_eq!(handle.listener_count(events::CONNECT), 1);

    let _second = connected_peer(&transport, &client).await;
    let mut rx = observer.watch();
    within(rx.wait_for(|c| *c)).await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_mount_during_connect_settles_connected() {
    for _ in 0..50 {
        let transport = MemoryTransport::new();
        let client = client(&transport);
        let acceptor = transport.clone();
        let accepted = tokio::spawn(async move { acceptor.accept().await });

        let observer = client.observer();
        let _peer = within(accepted).await.unwrap().unwrap();
        let handle = client.manager().get_socket().unwrap();
        helpers::wait_for_state(&handle, |s| s.is_connected()).await;

        let mut rx = observer.watch();
        within(rx.wait_for(|c| *c)).await.unwrap();
        assert!(observer.connected());
    }
}
