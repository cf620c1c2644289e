//! # hublink-core
//!
//! Core crate for HubLink. Contains the configuration schemas, the shared
//! event contract, and the unified error system.
//!
//! This crate has **no** internal dependencies on other HubLink crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;

pub use error::AppError;
pub use events::{EmitType, EventName};
pub use result::AppResult;
