//! Monitor Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Errors from the component crates are
//! re-raised under one of these kinds, keeping the original as a child frame.

use derive_more::{Display, Error};

/// A monitor error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The page could not be fetched; the cycle was skipped.
    #[display("fetching the search page failed")]
    Fetch,
    #[display("configuration error")]
    Config,
    #[display("store error")]
    Store,
    #[display("notifier setup failed")]
    Notify,
    #[display("logging setup failed")]
    Logging,
    /// A cycle panicked.
    #[display("cycle panicked: {_0}")]
    Panic(#[error(not(source))] String),
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch | Self::Panic(_) | Self::Io)
    }
}
