use crate::error::{Error, ErrorKind};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::{path::Path, str::FromStr};

/// Local file header signature.
const ZIP_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];
/// End of central directory signature (an empty zip starts with this).
const ZIP_EMPTY_MAGIC: [u8; 4] = [0x50, 0x4B, 0x05, 0x06];
/// Bytes needed by [`ArchiveKind::from_magic_bytes`].
pub const MAGIC_BYTES_LEN: usize = 4;

/// Container format of a comic archive.
///
/// Only zip is readable; everything else is carried around as
/// [`Unsupported`](Self::Unsupported) so callers can skip it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    /// Zip container (.cbz, .zip)
    Zip,
    #[default]
    Unsupported,
}

impl FromStr for ArchiveKind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zip" | "cbz" => Ok(ArchiveKind::Zip),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}
impl From<&[u8]> for ArchiveKind {
    fn from(value: &[u8]) -> Self {
        ArchiveKind::from_magic_bytes(value)
    }
}
impl Display for ArchiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ArchiveKind::Zip => write!(f, "zip"),
            ArchiveKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

impl ArchiveKind {
    /// Detect the archive format from a file extension.
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
            .unwrap_or_default()
    }

    /// Detect the archive format from the first few bytes of the file.
    #[must_use]
    pub fn from_magic_bytes(bytes: &[u8]) -> Self {
        if bytes.starts_with(&ZIP_MAGIC) || bytes.starts_with(&ZIP_EMPTY_MAGIC) {
            return ArchiveKind::Zip;
        }
        ArchiveKind::Unsupported
    }
}
