//! Storage models.

use longbox_archive::ArchiveKind;
use std::path::PathBuf;
use time::UtcDateTime;

/// File metadata returned by storage backends.
///
/// Size and modification time together act as the cheap "has this file
/// changed since the last import" fingerprint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: UtcDateTime,
    /// Archive format detected from the file extension
    pub kind: ArchiveKind,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: UtcDateTime) -> Self {
        let path = path.into();
        let kind = ArchiveKind::from_path(&path);
        Self { path, size, modified, kind }
    }

    /// Modification time truncated to whole seconds, which is all that
    /// survives a round trip through the library database.
    pub fn modified_timestamp(&self) -> i64 {
        self.modified.unix_timestamp()
    }
}
