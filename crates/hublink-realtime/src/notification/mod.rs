//! Client-side notification tracking.
//!
//! - [`store`]: ordered, observable collection cleared at session end
//! - [`binder`]: resolves pending notifications from server events
//! - [`expiry`]: optional timeout and auto-dismiss timers

pub mod binder;
pub mod expiry;
pub mod store;
pub mod types;

pub use binder::{NotificationBinder, Resolution, Resolver};
pub use expiry::ExpiryPolicy;
pub use store::NotificationStore;
pub use types::{Notification, NotificationStatus};
