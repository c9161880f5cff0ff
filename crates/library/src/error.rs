//! Library Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Archives that are skipped during an import (not a
//! comic, corrupt, no pages) are outcomes, not errors; see
//! [`SkipReason`](crate::sync::SkipReason).

use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Listing, reading or writing library files failed.
    #[display("storage error")]
    Storage,
    /// The catalog couldn't answer right now (rate limited, unreachable or
    /// too slow). Import the archive again later.
    #[display("catalog unavailable")]
    RemoteUnavailable,
    /// The catalog answered with something unusable.
    #[display("invalid catalog data")]
    Catalog,
    /// Reading from or writing to the library database failed.
    #[display("library database error")]
    Store,
    /// Two archives claim the same issue.
    #[display("conflict: {_0}")]
    PersistenceConflict(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage | Self::RemoteUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorKind::Storage, true)]
    #[case(ErrorKind::RemoteUnavailable, true)]
    #[case(ErrorKind::Catalog, false)]
    #[case(ErrorKind::Store, false)]
    #[case(ErrorKind::PersistenceConflict("a.cbz".to_string()), false)]
    fn test_retryable(#[case] kind: ErrorKind, #[case] expected: bool) {
        assert_eq!(kind.is_retryable(), expected);
    }

    #[test]
    fn test_display() {
        let err = ErrorKind::PersistenceConflict("issue 8192 is already at a.cbz".to_string());
        assert_eq!(err.to_string(), "conflict: issue 8192 is already at a.cbz");
    }
}
