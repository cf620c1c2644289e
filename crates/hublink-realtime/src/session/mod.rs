//! Authenticated session boundary.
//!
//! The notification store clears itself whenever a present session ends, via
//! a hook registered on [`AuthSession`].

pub mod auth;
pub mod token;

pub use auth::{AuthSession, SessionEndHook, SessionState};
pub use token::SessionToken;
