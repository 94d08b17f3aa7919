//! Convenience result type alias for MediaLib.

use crate::error::AppError;

/// A specialized `Result` type for MediaLib operations.
pub type AppResult<T> = Result<T, AppError>;
