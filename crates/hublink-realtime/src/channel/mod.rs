//! Event listener registration.

pub mod registry;
pub mod subscription;

pub use registry::{EventCallback, EventRegistry, ListenerId};
pub use subscription::{Subscription, SubscriptionSet};
