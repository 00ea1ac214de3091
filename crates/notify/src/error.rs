//! Notification Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Channel errors never leave the [`Notifier`](crate::Notifier): they are
//! logged and recorded as [`Outcome::Failed`](crate::Outcome::Failed).

use derive_more::{Display, Error};

/// A notification error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for notification operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The request never got a response.
    #[display("HTTP request failed")]
    Http,
    /// The endpoint answered with something other than 200.
    #[display("unexpected HTTP status: {_0}")]
    Status(#[error(not(source))] u16),
    /// A sender or recipient isn't a valid mailbox.
    #[display("invalid email address: {_0}")]
    Address(#[error(not(source))] String),
    #[display("failed to build email message")]
    Message,
    #[display("SMTP delivery failed")]
    Smtp,
    #[display("desktop notification failed")]
    Desktop,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http | Self::Smtp => true,
            Self::Status(code) => *code >= 500 || *code == 429,
            Self::Address(_) | Self::Message | Self::Desktop => false,
        }
    }
}
