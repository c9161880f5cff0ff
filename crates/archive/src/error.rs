//! Archive Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The file is not a zip container. Skip it.
    #[display("not a comic archive: {}", _0.display())]
    NotAnArchive(#[error(not(source))] PathBuf),
    /// The container or one of its members can't be read. Skip it.
    #[display("corrupt archive: {}", _0.display())]
    CorruptArchive(#[error(not(source))] PathBuf),
    /// No member with that name, or no page at that index.
    #[display("entry not found: {_0}")]
    EntryNotFound(#[error(not(source))] String),
    /// The requested archive format is not supported.
    #[display("unsupported format: {_0}")]
    UnsupportedFormat(#[error(not(source))] String),
    /// Reading the archive file itself failed.
    #[display("I/O error: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(ErrorKind::EntryNotFound("p001.jpg".to_string()).to_string(), "entry not found: p001.jpg");
        assert_eq!(
            ErrorKind::CorruptArchive(PathBuf::from("a/b.cbz")).to_string(),
            "corrupt archive: a/b.cbz"
        );
    }

    #[test]
    fn error_kind_retryable() {
        assert!(!ErrorKind::CorruptArchive(PathBuf::new()).is_retryable());
        assert!(!ErrorKind::NotAnArchive(PathBuf::new()).is_retryable());
        assert!(ErrorKind::Io(PathBuf::new()).is_retryable());
    }
}
