//! Catalog Error Types
//!
//! A record the catalog doesn't know about is not an error: lookups return
//! `Ok(None)` for that.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The catalog asked us to slow down. Try again later.
    #[display("rate limited by catalog")]
    RateLimited,
    /// The catalog couldn't be reached or failed to answer.
    #[display("catalog unavailable: {_0}")]
    Transient(#[error(not(source))] String),
    /// The lookup took longer than the configured timeout.
    #[display("catalog lookup timed out")]
    Timeout,
    /// The catalog answered with something that can't be used.
    #[display("invalid catalog data: {_0}")]
    InvalidData(#[error(not(source))] String),
    /// The requested record kind isn't recognised.
    #[display("unknown record kind: {_0}")]
    UnknownKind(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::Transient(_) | Self::Timeout)
    }
}
