//! Fetch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.
//!
//! Any fetch error means the cycle has nothing to work with: callers log it
//! and skip straight to the next scheduled attempt.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("chrome/chromium not detected on your system")]
    ChromeNotFound,
    /// The configured Chrome path does not exist or isn't executable.
    #[display("chrome/chromium not found at: {}", _0.display())]
    ChromeMissingAt(#[error(not(source))] PathBuf),
    #[display("chrome did not finish rendering in time")]
    ChromeTimeout,
    /// Chrome exited with a non-zero exit code, or `-1` when killed by a signal.
    #[display("chrome exited with code: {_0}")]
    ChromeFailed(#[error(not(source))] i32),
    /// The page loaded but produced no markup.
    #[display("page rendered empty")]
    EmptyPage,
    #[display("unexpected HTTP status: {_0}")]
    Status(#[error(not(source))] u16),
    #[display("invalid search URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    Network,
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ChromeTimeout | Self::EmptyPage | Self::Network => true,
            Self::Status(code) => *code >= 500 || *code == 429,
            _ => false,
        }
    }
}
