//! A directory on the local filesystem, through `tokio::fs`.

use crate::backend::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::{FileInfo, StorageBackend, validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

/// What walking found at one directory entry.
enum Found {
    File(FileInfo),
    Directory(PathBuf),
    /// Outside the prefix, or neither a file nor a directory (a dangling
    /// symlink, a socket).
    Nothing,
}

fn io_error(err: std::io::Error, path: &Path) -> ErrorKind {
    match err.kind() {
        IoErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
        IoErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
        _ => ErrorKind::Io(err),
    }
}

fn file_info(path: &Path, metadata: &std::fs::Metadata) -> Result<FileInfo> {
    let modified = metadata.modified().map_err(|err| io_error(err, path))?;
    Ok(FileInfo::new(path, metadata.len(), modified.into()))
}

#[derive(Debug, Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}

impl LocalBackend {
    /// Use the directory at `root`, creating it when missing.
    ///
    /// The root must be absolute; an existing file there is an
    /// [`InvalidPath`](ErrorKind::InvalidPath).
    ///
    /// ```no_run
    /// use longbox_storage::backend::LocalBackend;
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let media = LocalBackend::new("media", "/var/lib/longbox/media")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() || (root.exists() && !root.is_dir()) {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        // Blocking, but only ever once, at startup.
        std::fs::create_dir_all(&root).map_err(|err| io_error(err, &root))?;
        let name = name.into();
        tracing::debug!(backend = %name, root = %root.display(), "Using local storage");
        Ok(Self { name, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        Ok(self.root.join(validate_path(path)?))
    }

    /// The storage path of something found while walking the root.
    fn relative(&self, absolute: &Path) -> Result<PathBuf> {
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("{} is outside {}", absolute.display(), self.root.display()))
        })?;
        validate_path(relative)
    }

    async fn inspect(&self, entry: fs::DirEntry, prefix: Option<&Path>) -> Result<Found> {
        let absolute = entry.path();
        let relative = self.relative(&absolute)?;
        if prefix.is_some_and(|prefix| !relative.starts_with(prefix)) {
            return Ok(Found::Nothing);
        }
        // Follows symlinks, unlike `DirEntry::metadata`.
        let metadata = match fs::metadata(&absolute).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                tracing::debug!(backend = %self.name, path = %relative.display(), "Skipping dangling link");
                return Ok(Found::Nothing);
            },
            Err(err) => exn::bail!(io_error(err, &relative)),
        };
        Ok(match metadata {
            metadata if metadata.is_dir() => Found::Directory(absolute),
            metadata if metadata.is_file() => Found::File(file_info(&relative, &metadata)?),
            _ => Found::Nothing,
        })
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let prefix = match prefix.map(validate_path).transpose() {
            Ok(prefix) => prefix,
            Err(err) => return Box::pin(futures::stream::once(async { Err(err) })),
        };
        // Start one level above the prefix, so that the prefix itself can be
        // a file as well as a directory.
        let start = match prefix.as_deref().and_then(Path::parent) {
            Some(parent) => self.root.join(parent),
            None => self.root.clone(),
        };

        Box::pin(stream!({
            let mut pending = vec![start];
            while let Some(directory) = pending.pop() {
                let mut entries = match fs::read_dir(&directory).await {
                    Ok(entries) => entries,
                    Err(err) if err.kind() == IoErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(io_error(err, &directory)));
                        continue;
                    },
                };
                loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break,
                        Err(err) => {
                            yield Err(exn::Exn::from(io_error(err, &directory)));
                            break;
                        },
                    };
                    match self.inspect(entry, prefix.as_deref()).await {
                        Ok(Found::File(info)) => yield Ok(info),
                        Ok(Found::Directory(path)) => pending.push(path),
                        Ok(Found::Nothing) => {},
                        Err(err) => yield Err(err),
                    }
                }
            }
        }))
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let absolute = self.resolve(path)?;
        Ok(fs::try_exists(&absolute).await.map_err(|err| io_error(err, path))?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let absolute = self.resolve(path)?;
        Ok(fs::read(&absolute).await.map_err(|err| io_error(err, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let absolute = self.resolve(path)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await.map_err(|err| io_error(err, path))?;
        }
        Ok(fs::write(&absolute, data).await.map_err(|err| io_error(err, path))?)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let absolute = self.resolve(path)?;
        Ok(fs::remove_file(&absolute).await.map_err(|err| io_error(err, path))?)
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let absolute = self.resolve(path)?;
        let metadata = fs::metadata(&absolute).await.map_err(|err| io_error(err, path))?;
        file_info(&validate_path(path)?, &metadata)
    }
}
