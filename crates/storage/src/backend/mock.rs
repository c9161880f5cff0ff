//! A backend that lives in a `HashMap`.

use super::FileInfoStream;
use crate::error::{ErrorKind, Result};
use crate::{FileInfo, StorageBackend, validate_path};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::sync::RwLock;

struct Stored {
    modified: UtcDateTime,
    data: Vec<u8>,
}

/// In-memory [`StorageBackend`] for tests.
///
/// Test setup helpers panic on invalid paths instead of returning errors.
///
/// ```
/// use longbox_storage::backend::{MockBackend, StorageBackend};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let comics = MockBackend::with_files([("DC/Batman 713.cbz", b"PK\x03\x04")]);
/// let media = MockBackend::default().with_name("media");
/// media.write(Path::new("covers/DC/Batman 713.jpg"), b"\xFF\xD8").await?;
/// assert!(comics.exists(Path::new("DC/Batman 713.cbz")).await?);
/// # Ok(())
/// # }
/// ```
pub struct MockBackend {
    name: String,
    files: RwLock<HashMap<PathBuf, Stored>>,
}

fn test_path(path: &Path) -> PathBuf {
    match validate_path(path) {
        Ok(path) => path,
        Err(_) => panic!("MockBackend: invalid path {}", path.display()),
    }
}

impl MockBackend {
    /// Every file gets the same modification time: now.
    pub fn with_files(files: impl IntoIterator<Item = (impl Into<PathBuf>, impl Into<Vec<u8>>)>) -> Self {
        let modified = UtcDateTime::now();
        let files = files
            .into_iter()
            .map(|(path, data)| {
                let path: PathBuf = path.into();
                (test_path(&path), Stored { modified, data: data.into() })
            })
            .collect();
        Self { name: "mock".to_string(), files: RwLock::new(files) }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace a file's contents and pin its modification time, as if it had
    /// been edited on disk between two imports.
    pub async fn touch(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>, modified: UtcDateTime) {
        let path = test_path(path.as_ref());
        self.files.write().await.insert(path, Stored { modified, data: data.into() });
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::with_files(Vec::<(PathBuf, Vec<u8>)>::new())
    }
}

#[async_trait]
impl StorageBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let prefix = match prefix.map(validate_path).transpose() {
            Ok(prefix) => prefix,
            Err(err) => return Box::pin(futures::stream::once(async { Err(err) })),
        };
        Box::pin(async_stream::stream!({
            // Collected first; the lock must not be held across a yield.
            let matching: Vec<FileInfo> = {
                let files = self.files.read().await;
                files
                    .iter()
                    .filter(|(path, _)| prefix.as_ref().is_none_or(|prefix| path.starts_with(prefix)))
                    .map(|(path, stored)| FileInfo::new(path, stored.data.len() as u64, stored.modified))
                    .collect()
            };
            for info in matching {
                yield Ok(info);
            }
        }))
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let path = validate_path(path)?;
        Ok(self.files.read().await.contains_key(&path))
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let path = validate_path(path)?;
        match self.files.read().await.get(&path) {
            Some(stored) => Ok(stored.data.clone()),
            None => exn::bail!(ErrorKind::NotFound(path)),
        }
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let path = validate_path(path)?;
        let stored = Stored { modified: UtcDateTime::now(), data: data.to_vec() };
        self.files.write().await.insert(path, stored);
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let path = validate_path(path)?;
        if self.files.write().await.remove(&path).is_none() {
            exn::bail!(ErrorKind::NotFound(path));
        }
        Ok(())
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let path = validate_path(path)?;
        match self.files.read().await.get(&path) {
            Some(stored) => Ok(FileInfo::new(&path, stored.data.len() as u64, stored.modified)),
            None => exn::bail!(ErrorKind::NotFound(path)),
        }
    }
}
