//! Command-line errors.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// What the command was doing when it failed; the cause is attached.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not open the library")]
    Setup,
    #[display("could not read {_0}")]
    Read(#[error(not(source))] String),
    #[display("import failed")]
    Import,
    #[display("refresh failed")]
    Refresh,
}
