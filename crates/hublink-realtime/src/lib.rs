//! # hublink-realtime
//!
//! Realtime client session layer for HubLink. Provides:
//!
//! - A single managed connection with bounded automatic reconnection
//! - Safe emit/subscribe over that connection with scoped subscriptions
//! - A connection-state observer for presentation code
//! - Notification tracking resolved by server events and cleared at session end

pub mod channel;
pub mod client;
pub mod connection;
pub mod facade;
pub mod message;
pub mod metrics;
pub mod notification;
pub mod observer;
pub mod session;
pub mod transport;

pub use channel::{Subscription, SubscriptionSet};
pub use client::RealtimeClient;
pub use connection::{ConnectionHandle, ConnectionManager, ConnectionState};
pub use facade::SocketFacade;
pub use metrics::{MetricsSnapshot, RealtimeMetrics};
pub use notification::{Notification, NotificationBinder, NotificationStatus, NotificationStore};
pub use observer::ConnectionObserver;
pub use session::{AuthSession, SessionToken};
