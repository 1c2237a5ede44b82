//! Error types for the core data model.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, ClockError>;

/// Errors raised by the in-fiction clock.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClockError {
    /// A timestamp did not match `YYYY-MM-DD HH:mm:ss` or is not a real calendar time.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Advancing the clock ran past the representable date range.
    #[error("clock overflow advancing {from} by {minutes} minutes")]
    Overflow {
        /// Timestamp the clock was advanced from.
        from: String,
        /// Size of the attempted step, in minutes.
        minutes: i64,
    },
}
