//! Convenience result type alias for HubLink.

use crate::error::AppError;

/// A specialized `Result` type for HubLink operations.
pub type AppResult<T> = Result<T, AppError>;
