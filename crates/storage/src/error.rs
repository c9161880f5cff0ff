use derive_more::{Display, Error};
use std::path::PathBuf;

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("no such file: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    #[display("not allowed to access {}", _0.display())]
    PermissionDenied(#[error(not(source))] PathBuf),
    #[display("filesystem error: {_0}")]
    Io(std::io::Error),
    /// Escapes the backend root, or is not a path at all.
    #[display("not a usable library path: {}", _0.display())]
    InvalidPath(#[error(not(source))] PathBuf),
    #[display("storage backend failed: {_0}")]
    BackendError(#[error(not(source))] String),
    /// Refused by [`ArchiveOnlyBackend`](crate::backend::ArchiveOnlyBackend).
    #[display("not a comic archive: {}", _0.display())]
    FilteredPath(#[error(not(source))] PathBuf),
}

impl From<std::io::Error> for ErrorKind {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl ErrorKind {
    /// Missing files and rejected paths stay that way; anything else
    /// might clear up by the next import.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::BackendError(_))
    }
}
