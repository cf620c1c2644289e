//! Connection lifecycle: handle, driver, reconnect policy and manager.

pub mod driver;
pub mod events;
pub mod handle;
pub mod manager;
pub mod reconnect;
pub mod state;

pub use handle::{ConnectionHandle, ConnectionId};
pub use manager::ConnectionManager;
pub use reconnect::ReconnectPolicy;
pub use state::{CloseReason, ConnectionState};
