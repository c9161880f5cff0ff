//! Narrow a backend down to comic archives.

use crate::backend::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::{BackendHandle, FileInfo, StorageBackend};
use async_trait::async_trait;
use futures::StreamExt;
use longbox_archive::ArchiveKind;
use std::path::Path;

/// A readable archive format, and not a hidden file. macOS leaves
/// `._Batman 713.cbz` resource forks next to real archives.
fn is_comic_archive(path: &Path) -> bool {
    let visible = path.file_name().and_then(|name| name.to_str()).is_some_and(|name| !name.starts_with('.'));
    visible && ArchiveKind::from_path(path) != ArchiveKind::Unsupported
}

/// Wraps the comics directory so that the importer never sees cover
/// images, `ComicInfo.xml` sidecars, `.cbr` files or other clutter.
///
/// Listings drop anything else without complaint. Reading, writing or
/// deleting any other path is a [`FilteredPath`](ErrorKind::FilteredPath).
#[derive(Clone)]
pub struct ArchiveOnlyBackend {
    inner: BackendHandle,
}

impl ArchiveOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }

    fn allow(path: &Path) -> Result<()> {
        if is_comic_archive(path) {
            return Ok(());
        }
        exn::bail!(ErrorKind::FilteredPath(path.to_path_buf()))
    }
}

#[async_trait]
impl StorageBackend for ArchiveOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let archives = self.inner.list_stream(prefix).filter(|item| {
            let keep = item.as_ref().map_or(true, |info| is_comic_archive(&info.path));
            std::future::ready(keep)
        });
        Box::pin(archives)
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Self::allow(path)?;
        self.inner.exists(path).await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Self::allow(path)?;
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        Self::allow(path)?;
        self.inner.write(path, data).await
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        Self::allow(path)?;
        self.inner.delete(path).await
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        Self::allow(path)?;
        self.inner.stat(path).await
    }
}
