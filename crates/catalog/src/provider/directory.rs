//! Catalog backed by a directory of JSON documents.

use crate::error::{ErrorKind, Result};
use crate::models::{Fragment, Kind};
use crate::provider::Catalog;
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Serves catalog records from `<root>/<kind>/<id>.json`.
///
/// A missing file means the catalog doesn't know the record. Any other read
/// failure is [`Transient`](ErrorKind::Transient); a document that doesn't
/// decode, or that describes a different record, is
/// [`InvalidData`](ErrorKind::InvalidData).
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    root: PathBuf,
}
impl DirectoryCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document_path(&self, kind: Kind, id: u64) -> PathBuf {
        self.root.join(kind.as_str()).join(format!("{id}.json"))
    }
}

#[async_trait]
impl Catalog for DirectoryCatalog {
    fn name(&self) -> &str {
        "directory"
    }

    async fn lookup(&self, kind: Kind, id: u64) -> Result<Option<Fragment>> {
        let path = self.document_path(kind, id);
        let json = match fs::read(&path).await {
            Ok(json) => json,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(%kind, id, path = %path.display(), "No catalog document");
                return Ok(None);
            },
            Err(err) => exn::bail!(ErrorKind::Transient(format!("{}: {err}", path.display()))),
        };
        let fragment = Fragment::from_json(kind, &json)
            .or_raise(|| ErrorKind::InvalidData(format!("{kind} {id}")))?;
        if fragment.id() != id {
            exn::bail!(ErrorKind::InvalidData(format!("{kind} {id} describes {}", fragment.id())));
        }
        Ok(Some(fragment))
    }
}
