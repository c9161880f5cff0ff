//! Store Error Types

use derive_more::{Display, Error};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    #[display("not found: {_0}")]
    NotFound(#[error(not(source))] String),
    /// A row couldn't be converted to or from its model.
    #[display("invalid library data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
    /// The write would break a uniqueness rule (path or external id).
    #[display("conflicting record: {_0}")]
    Conflict(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}
