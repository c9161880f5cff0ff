use crate::error::{ErrorKind, Result};
use crate::reconcile::reconcile;
use crate::remote::issue_metadata;
use crate::sync::{Outcome, SkipReason};
use crate::{Library, StoreResultExt};
use exn::ResultExt;
use longbox_archive::ComicArchive;
use longbox_storage::FileInfo;
use longbox_store::models::{Issue, IssueDraft};
use std::path::{Path, PathBuf};
use tracing::instrument;

const COVERS_DIRECTORY: &str = "covers";

/// Where the cover of the archive at `path` is written in the media
/// directory: the archive's own path, with the cover image's extension.
fn cover_path(path: &Path, page_name: &str) -> PathBuf {
    let extension = Path::new(page_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "jpg".to_string());
    Path::new(COVERS_DIRECTORY).join(path.with_extension(extension))
}

impl Library {
    /// Import one archive.
    ///
    /// Skips are outcomes; only failures that might go away (or need a
    /// person to look at them) are errors.
    #[instrument(level = "debug", skip_all, fields(path = %file.path.display()))]
    pub(crate) async fn import_file(&self, file: FileInfo) -> Result<Outcome> {
        let at_path = self.store.find_issue_by_path(&file.path).await.or_store()?;
        if let Some(issue) = at_path.as_ref().filter(|issue| issue.is_unchanged(file.size, file.modified)) {
            tracing::debug!(issue = issue.id, "Unchanged since last import");
            return Ok(Outcome::Unchanged(issue.clone()));
        }

        let bytes = self.comics.read(&file.path).await.or_raise(|| ErrorKind::Storage)?;
        let mut archive = match self.open_archive(&file.path, bytes) {
            Ok(archive) => archive,
            Err(reason) => {
                tracing::info!(path = %file.path.display(), %reason, "Skipping archive");
                return Ok(Outcome::Skipped(reason));
            },
        };
        let embedded = archive.read_metadata().clone();
        let filename = archive.metadata_from_filename(self.options.retain_scan_info);

        // Identified
        let cvid = embedded.external_id();
        let existing = match cvid {
            Some(cvid) => match self.store.find_issue_by_cvid(cvid).await.or_store()? {
                Some(issue) => Some(self.moved_issue(issue, &file.path).await?),
                None => at_path,
            },
            None => at_path,
        };
        // The cover is only ever taken when the issue is created, and an
        // unreadable first page is as good as a corrupt archive.
        let cover = match &existing {
            Some(_) => None,
            None => match Self::read_cover(&mut archive) {
                Some(cover) => Some(cover),
                None => {
                    tracing::info!(path = %file.path.display(), "Skipping archive with unreadable cover");
                    return Ok(Outcome::Skipped(SkipReason::Corrupt));
                },
            },
        };

        // Reconciled
        let remote = match cvid {
            Some(cvid) => self.lookup_issue(cvid).await?,
            None => None,
        };
        let recorded = match &existing {
            Some(issue) => Some(self.recorded_metadata(issue).await?),
            None => None,
        };
        let remote_metadata = remote.as_ref().map(issue_metadata);
        let mut merged = reconcile(recorded.as_ref(), remote_metadata.as_ref(), &embedded, &filename);
        let series_name = match merged.series.take() {
            Some(name) => name,
            None => file.path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default(),
        };
        merged.series = Some(series_name.clone());

        // Persisted: parents, then the issue, then its relations.
        let series = match remote.as_ref().and_then(|issue| issue.series.as_ref()) {
            Some(reference) => match self.remote_series(reference, &merged).await? {
                Some(series) => series,
                None => self.local_series(&series_name, &merged).await?,
            },
            None => self.local_series(&series_name, &merged).await?,
        };
        let mut draft = IssueDraft {
            cvid,
            series_id: series.id,
            number: merged.issue.clone(),
            name: merged.title.clone(),
            description: merged.description.clone(),
            cover_date: merged.cover_date(),
            scan_info: merged.scan_info.clone(),
            path: file.path.clone(),
            file_size: file.size,
            file_modified: file.modified,
            page_count: merged.page_count,
            cover: None,
        };
        let outcome = match existing {
            Some(issue) => {
                let issue = self.store.update_issue(issue.id, &draft).await.or_store()?;
                tracing::info!(issue = issue.id, "Updated issue");
                Outcome::Updated(issue)
            },
            None => {
                if let Some((page_name, image)) = cover {
                    let path = cover_path(&file.path, &page_name);
                    self.media.write(&path, &image).await.or_raise(|| ErrorKind::Storage)?;
                    draft.cover = Some(path.to_string_lossy().into_owned());
                }
                let issue = self.store.create_issue(&draft).await.or_store()?;
                tracing::info!(issue = issue.id, slug = %issue.slug, "Created issue");
                Outcome::Created(issue)
            },
        };
        let issue_id = match &outcome {
            Outcome::Created(issue) | Outcome::Updated(issue) => issue.id,
            Outcome::Unchanged(_) | Outcome::Skipped(_) => return Ok(outcome),
        };
        self.save_relations(issue_id, &merged, remote.as_ref()).await?;
        Ok(outcome)
    }

    /// Opens the archive, or says why it has to be skipped.
    fn open_archive(&self, path: &Path, bytes: Vec<u8>) -> std::result::Result<ComicArchive, SkipReason> {
        let mut archive = match ComicArchive::from_bytes(path, bytes) {
            Ok(archive) => archive,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %*err, "Corrupt archive");
                return Err(SkipReason::Corrupt);
            },
        };
        if let Some(page) = &self.options.fallback_page {
            archive = archive.with_fallback_page(page.clone());
        }
        if !archive.is_archive() {
            return Err(SkipReason::NotAnArchive);
        }
        if archive.page_count() == 0 {
            return Err(SkipReason::NoPages);
        }
        Ok(archive)
    }

    /// The first page's name and bytes.
    fn read_cover(archive: &mut ComicArchive) -> Option<(String, Vec<u8>)> {
        let name = archive.page_name(0)?;
        match archive.page(0) {
            Ok(image) => Some((name, image)),
            Err(err) => {
                tracing::warn!(path = %archive.path().display(), error = %*err, "Unreadable cover page");
                None
            },
        }
    }

    /// An issue found by external id at another path.
    ///
    /// If the file it was imported from is gone, the archive was moved and
    /// the issue follows it. If not, two archives claim the same issue.
    async fn moved_issue(&self, issue: Issue, path: &Path) -> Result<Issue> {
        if issue.path == path {
            return Ok(issue);
        }
        if self.comics.exists(&issue.path).await.or_raise(|| ErrorKind::Storage)? {
            exn::bail!(ErrorKind::PersistenceConflict(format!(
                "issue {} is already imported from {}",
                issue.id,
                issue.path.display()
            )));
        }
        tracing::info!(from = %issue.path.display(), to = %path.display(), issue = issue.id, "Archive moved");
        Ok(issue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cover_path() {
        assert_eq!(
            cover_path(Path::new("Charlton/Captain Atom 078.cbz"), "p001.PNG"),
            PathBuf::from("covers/Charlton/Captain Atom 078.png")
        );
        assert_eq!(cover_path(Path::new("Batman 713.cbz"), "cover"), PathBuf::from("covers/Batman 713.jpg"));
    }
}
