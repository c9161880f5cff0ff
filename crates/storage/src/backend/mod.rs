//! The [`StorageBackend`] trait and its implementations.
//!
//! - [`LocalBackend`] is a directory on the local filesystem.
//! - [`ArchiveOnlyBackend`] narrows another backend down to comic archives.
//! - [`MockBackend`] (`mock` feature) keeps everything in memory for tests.

mod archive;
mod local;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::archive::ArchiveOnlyBackend;
pub use self::local::LocalBackend;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBackend;
use crate::error::Result;
use crate::models::FileInfo;
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::path::Path;
use std::pin::Pin;

pub type FileInfoStream<'a> = Pin<Box<dyn Stream<Item = Result<FileInfo>> + Send + 'a>>;

/// A rooted tree of files: the comics directory, or the media directory.
///
/// Paths are always relative to the root. Implementations run every path
/// through [`validate_path`](crate::validate_path) and refuse anything that
/// would leave the root.
///
/// # Examples
///
/// ```
/// use longbox_storage::{backend::StorageBackend, error::Result};
/// use std::path::Path;
///
/// /// Total size of everything under a publisher's directory.
/// async fn publisher_size(comics: &dyn StorageBackend, publisher: &str) -> Result<u64> {
///     let files = comics.list(Some(Path::new(publisher))).await?;
///     Ok(files.iter().map(|file| file.size).sum())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Shows up in logs, nowhere else.
    fn name(&self) -> &str;

    /// Every file under `prefix` (or the whole tree), collected from
    /// [`list_stream`](Self::list_stream).
    async fn list(&self, prefix: Option<&Path>) -> Result<Vec<FileInfo>> {
        self.list_stream(prefix).try_collect().await
    }

    /// Walk the tree, one file at a time, in no particular order.
    ///
    /// `prefix` matches whole path components: `Marvel/X-Men` covers
    /// `Marvel/X-Men/X-Men 001.cbz` but not `Marvel/X-Men Annual/...`. A
    /// prefix that matches nothing is an empty listing.
    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a>;

    async fn exists(&self, path: &Path) -> Result<bool>;

    /// The whole file. [`NotFound`](crate::error::ErrorKind::NotFound) when
    /// there is no such file.
    async fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Create or replace a file, and any directories leading to it.
    async fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// [`NotFound`](crate::error::ErrorKind::NotFound) when there is no such
    /// file.
    async fn delete(&self, path: &Path) -> Result<()>;

    /// Size and modification time, without reading the file.
    async fn stat(&self, path: &Path) -> Result<FileInfo>;
}
