//! Removing issues from the library.

use crate::error::{ErrorKind, Result};
use crate::{Library, StoreResultExt};
use exn::ResultExt;
use longbox_storage::error::ErrorKind as StorageErrorKind;
use std::path::Path;
use tracing::instrument;

impl Library {
    /// Delete an issue and the cover image taken from its archive. The
    /// archive itself is left alone.
    ///
    /// Returns `false` if there was no such issue.
    #[instrument(skip(self))]
    pub async fn delete_issue(&self, id: i64) -> Result<bool> {
        let Some(issue) = self.store.get_issue(id).await.or_store()? else {
            return Ok(false);
        };
        if let Some(cover) = &issue.cover {
            match self.media.delete(Path::new(cover)).await {
                Ok(()) => {},
                Err(err) if matches!(&*err, StorageErrorKind::NotFound(_)) => {
                    tracing::debug!(%cover, "Cover already gone");
                },
                Err(err) => return Err(err).or_raise(|| ErrorKind::Storage),
            }
        }
        let deleted = self.store.delete_issue(id).await.or_store()?;
        tracing::info!(issue = id, path = %issue.path.display(), "Issue deleted");
        Ok(deleted)
    }
}
