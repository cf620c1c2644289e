//! Integration tests for notification tracking.

mod helpers;

use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use hublink_realtime::notification::NotificationStore;
use hublink_realtime::transport::MemoryTransport;
use hublink_realtime::{Notification, NotificationStatus, SessionToken, SubscriptionSet};

use helpers::{client, connected_peer, forwarder, next, within};

async fn wait_for_status(store: &NotificationStore, id: &str, status: NotificationStatus) {
    let mut rx = store.subscribe();
    within(rx.wait_for(|items| items.iter().any(|n| n.id == id && n.status == status)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_pending_notification_resolved_by_server_event() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    client.session().login(SessionToken::new("token")).unwrap();
    let mut binder = client
        .binder()
        .bind_outcome("upload:done", NotificationStatus::Success, "Uploaded")
        .bind_outcome("upload:failed", NotificationStatus::Error, "Upload failed");
    binder.mount();
    let mut peer = connected_peer(&transport, &client).await;

    let sent = binder.track(
        Notification::pending("t1", "Uploading", "report.pdf"),
        "upload",
        vec![json!({"notificationId": "t1", "file": "report.pdf"})],
    );
    assert!(sent);
    assert_eq!(within(peer.recv()).await.unwrap().event, "upload");
    assert_eq!(
        client.store().get("t1").unwrap().status,
        NotificationStatus::Pending
    );

    peer.push("upload:done", vec![json!({"notificationId": "t1"})]).await;
    wait_for_status(client.store(), "t1", NotificationStatus::Success).await;

    let store = client.store().snapshot();
    assert_eq!(store.len(), 1);
    assert_eq!(store[0].title, "Uploaded");
    assert_eq!(store[0].body, "report.pdf");
}

#[tokio::test]
async fn test_failure_event_overrides_title_and_body() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    let mut binder = client
        .binder()
        .correlation_key("requestId")
        .bind_outcome("save:failed", NotificationStatus::Error, "Save failed");
    binder.mount();
    let peer = connected_peer(&transport, &client).await;

    client
        .store()
        .add(Notification::pending("42", "Saving", "topology"));
    peer.push(
        "save:failed",
        vec![json!({"requestId": 42, "title": "Rejected", "body": "device busy"})],
    )
    .await;
    wait_for_status(client.store(), "42", NotificationStatus::Error).await;

    let n = client.store().get("42").unwrap();
    assert_eq!(n.title, "Rejected");
    assert_eq!(n.body, "device busy");
}

#[tokio::test]
async fn test_resolution_outlives_view_subscriptions() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    let mut binder = client
        .binder()
        .bind_outcome("book:done", NotificationStatus::Success, "Booked");
    binder.mount();
    let peer = connected_peer(&transport, &client).await;

    // A view registers its own listener, starts the request, then goes away.
    let mut view = SubscriptionSet::new();
    view.push(client.facade().on("book:done", |_| {}));
    binder.track(
        Notification::pending("b1", "Booking", "rack 3"),
        "book_device",
        vec![json!({"notificationId": "b1"})],
    );
    drop(view);

    peer.push("book:done", vec![json!({"notificationId": "b1"})]).await;
    wait_for_status(client.store(), "b1", NotificationStatus::Success).await;
}

#[tokio::test]
async fn test_unmounted_binder_leaves_notification_pending() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    let mut binder = client
        .binder()
        .bind_outcome("book:done", NotificationStatus::Success, "Booked");
    binder.mount();
    binder.unmount();
    assert_eq!(binder.listener_count(), 0);

    let (sync, mut sync_rx) = forwarder();
    let _sync = client.facade().on("sync", sync);
    let peer = connected_peer(&transport, &client).await;
    client.store().add(Notification::pending("b1", "Booking", ""));

    peer.push("book:done", vec![json!({"notificationId": "b1"})]).await;
    peer.push("sync", vec![]).await;
    next(&mut sync_rx).await;
    assert_eq!(
        client.store().get("b1").unwrap().status,
        NotificationStatus::Pending
    );
}

#[tokio::test]
async fn test_binder_remounts_on_new_handle() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    let mut binder = client
        .binder()
        .bind_outcome("book:done", NotificationStatus::Success, "Booked");
    binder.mount();
    let _first = connected_peer(&transport, &client).await;

    client.manager().disconnect();
    client.manager().connect().unwrap();
    binder.remount();
    let peer = connected_peer(&transport, &client).await;

    client.store().add(Notification::pending("b2", "Booking", ""));
    peer.push("book:done", vec![json!({"notificationId": "b2"})]).await;
    wait_for_status(client.store(), "b2", NotificationStatus::Success).await;
}

#[tokio::test]
async fn test_logout_clears_all_notifications() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    client.session().login(SessionToken::new("token")).unwrap();
    client
        .store()
        .add(Notification::pending("t1", "Uploading", ""));
    client
        .store()
        .add(Notification::new("t2", "Deleted", "", NotificationStatus::Success));

    client.session().logout();
    assert!(client.store().is_empty());
}

#[tokio::test]
async fn test_logout_then_relogin_keeps_new_session_notifications() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    client.session().login(SessionToken::new("a")).unwrap();
    client.store().add(Notification::pending("t1", "Uploading", ""));
    client.store().add(Notification::pending("t2", "Deleting", ""));

    client.session().logout();
    assert_eq!(client.store().len(), 0);
    client.session().login(SessionToken::new("b")).unwrap();
    client.store().add(Notification::pending("n3", "Saving", ""));

    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    let items = client.store().snapshot();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, "n3");
    assert_eq!(client.session().state().epoch, 1);
}

#[tokio::test]
async fn test_refresh_keeps_notifications() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    client.session().login(SessionToken::new("a")).unwrap();
    client.store().add(Notification::pending("t1", "Uploading", ""));

    client.session().refresh(SessionToken::new("b")).unwrap();
    tokio::task::yield_now().await;
    assert_eq!(client.store().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_token_expiry_clears_notifications() {
    let transport = MemoryTransport::new();
    let client = client(&transport);
    let expires_at = Utc::now() + chrono::Duration::seconds(60);
    client
        .session()
        .login(SessionToken::with_expiry("token", expires_at))
        .unwrap();
    client.store().add(Notification::pending("t1", "Uploading", ""));

    let mut rx = client.store().subscribe();
    tokio::time::timeout(
        Duration::from_secs(120),
        rx.wait_for(|items| items.is_empty()),
    )
    .await
    .expect("notifications cleared at expiry")
    .unwrap();
    assert!(!client.session().is_authenticated());
}
