use super::{Repository, slug_base, unique_slug};
use crate::error::{ErrorKind, Result};
use crate::models::{Issue, IssueDraft, IssueParams, IssueRow, ReadingStatus, cvid_to_row};
use exn::{OptionExt, ResultExt};
use sqlx::SqliteConnection;
use std::path::Path;
use time::UtcDateTime;
use tracing::instrument;

impl Repository {
    fn sqlx_hates_paths(path: &Path) -> Result<&str> {
        path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))
    }

    pub async fn get_issue(&self, id: i64) -> Result<Option<Issue>> {
        let row: Option<IssueRow> = sqlx::query_as(include_str!("../../queries/issue/get.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Issue::try_from).transpose()
    }

    pub async fn find_issue_by_cvid(&self, cvid: u64) -> Result<Option<Issue>> {
        let row: Option<IssueRow> = sqlx::query_as(include_str!("../../queries/issue/find_by_cvid.sql"))
            .bind(cvid_to_row(Some(cvid))?)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Issue::try_from).transpose()
    }

    /// Find an issue by its archive path, relative to the comics directory.
    pub async fn find_issue_by_path(&self, path: impl AsRef<Path>) -> Result<Option<Issue>> {
        let row: Option<IssueRow> = sqlx::query_as(include_str!("../../queries/issue/find_by_path.sql"))
            .bind(Self::sqlx_hates_paths(path.as_ref())?)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Issue::try_from).transpose()
    }

    /// Insert a new issue, unread and on its first page.
    ///
    /// The slug is derived from the series name and the issue number.
    /// Returns [`Conflict`](ErrorKind::Conflict) if another issue already
    /// holds the path or the external id, and
    /// [`NotFound`](ErrorKind::NotFound) if the series doesn't exist.
    #[instrument(level = "debug", skip_all, fields(path = %draft.path.display(), cvid = ?draft.cvid))]
    pub async fn create_issue(&self, draft: &IssueDraft) -> Result<Issue> {
        let params = IssueParams::try_from(draft)?;
        let now = UtcDateTime::now().unix_timestamp();
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;

        let series_name: Option<(String,)> = sqlx::query_as(include_str!("../../queries/issue/series_name.sql"))
            .bind(params.series_id)
            .fetch_optional(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let (series_name,) = series_name.ok_or_raise(|| ErrorKind::NotFound(format!("series {}", params.series_id)))?;
        Self::check_issue_conflicts(&mut tx, None, &params).await?;

        let base = match (&params.number, &params.name) {
            (Some(number), _) => slug_base(&format!("{series_name} {number}")),
            (None, Some(name)) => slug_base(&format!("{series_name} {name}")),
            (None, None) => slug_base(&series_name),
        };
        let slug = unique_slug(&mut tx, "issues", &base).await?;
        let row: IssueRow = sqlx::query_as(include_str!("../../queries/issue/insert.sql"))
            .bind(params.cvid)
            .bind(params.series_id)
            .bind(slug)
            .bind(params.number)
            .bind(params.name)
            .bind(params.description)
            .bind(params.cover_date)
            .bind(params.scan_info)
            .bind(params.path)
            .bind(params.file_size)
            .bind(params.file_modified)
            .bind(params.page_count)
            .bind(params.cover)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        row.try_into()
    }

    /// Overwrite an issue's metadata and file fingerprint.
    ///
    /// Reading state and slug are never touched, and the cover is only set
    /// if the issue doesn't have one yet.
    #[instrument(level = "debug", skip(self, draft), fields(path = %draft.path.display()))]
    pub async fn update_issue(&self, id: i64, draft: &IssueDraft) -> Result<Issue> {
        let params = IssueParams::try_from(draft)?;
        let now = UtcDateTime::now().unix_timestamp();
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        Self::check_issue_conflicts(&mut tx, Some(id), &params).await?;
        let row: Option<IssueRow> = sqlx::query_as(include_str!("../../queries/issue/update.sql"))
            .bind(params.cvid)
            .bind(params.series_id)
            .bind(params.number)
            .bind(params.name)
            .bind(params.description)
            .bind(params.cover_date)
            .bind(params.scan_info)
            .bind(params.path)
            .bind(params.file_size)
            .bind(params.file_modified)
            .bind(params.page_count)
            .bind(params.cover)
            .bind(now)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let row = row.ok_or_raise(|| ErrorKind::NotFound(format!("issue {id}")))?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        row.try_into()
    }

    /// Record where a reader is in an issue.
    ///
    /// This is the only write to `status` and `leaf`.
    pub async fn update_reading_state(&self, id: i64, status: ReadingStatus, leaf: usize) -> Result<()> {
        let issue = self.get_issue(id).await?.ok_or_raise(|| ErrorKind::NotFound(format!("issue {id}")))?;
        if issue.page_count > 0 && leaf >= issue.page_count {
            exn::bail!(ErrorKind::InvalidData("leaf"));
        }
        let leaf = i64::try_from(leaf).or_raise(|| ErrorKind::InvalidData("leaf"))?;
        sqlx::query(include_str!("../../queries/issue/update_reading_state.sql"))
            .bind(status.as_str())
            .bind(leaf)
            .bind(id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Delete an issue along with its credits and arc links, then delete any
    /// arc no longer linked to an issue.
    ///
    /// Returns `false` if there was no such issue.
    #[instrument(level = "debug", skip(self))]
    pub async fn delete_issue(&self, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let deleted = sqlx::query(include_str!("../../queries/issue/delete.sql"))
            .bind(id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        if deleted == 0 {
            return Ok(false);
        }
        Self::prune_orphan_arcs(&mut tx).await?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(true)
    }

    /// Fail if an issue other than `own` already holds the path or external id.
    async fn check_issue_conflicts(conn: &mut SqliteConnection, own: Option<i64>, params: &IssueParams) -> Result<()> {
        let by_path: Option<IssueRow> = sqlx::query_as(include_str!("../../queries/issue/find_by_path.sql"))
            .bind(&params.path)
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        if let Some(row) = by_path.filter(|row| Some(row.id) != own) {
            exn::bail!(ErrorKind::Conflict(format!("path {} belongs to issue {}", params.path, row.id)));
        }
        if let Some(cvid) = params.cvid {
            let by_cvid: Option<IssueRow> = sqlx::query_as(include_str!("../../queries/issue/find_by_cvid.sql"))
                .bind(cvid)
                .fetch_optional(&mut *conn)
                .await
                .or_raise(|| ErrorKind::Database)?;
            if let Some(row) = by_cvid.filter(|row| Some(row.id) != own) {
                exn::bail!(ErrorKind::Conflict(format!("external id {cvid} belongs to issue {}", row.id)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::Database;
    use crate::models::{EntityDraft, EntityKind, SeriesDraft};
    use std::path::PathBuf;
    use time::macros::date;

    pub(crate) async fn setup() -> (Repository, i64) {
        let repo = Repository::from(&Database::connect_in_memory().await.unwrap());
        let series = repo
            .upsert_series(&SeriesDraft {
                name: "Captain Atom".to_string(),
                sort_name: "captain atom".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (repo, series.get().id)
    }

    pub(crate) fn draft(series_id: i64, path: &str, number: &str) -> IssueDraft {
        IssueDraft {
            cvid: None,
            series_id,
            number: Some(number.to_string()),
            name: None,
            description: None,
            cover_date: Some(date!(1965-12-01)),
            scan_info: None,
            path: PathBuf::from(path),
            file_size: 4096,
            file_modified: UtcDateTime::from_unix_timestamp(1_600_000_000).unwrap(),
            page_count: 24,
            cover: Some("covers/captain-atom-78.png".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_issue() {
        let (repo, series_id) = setup().await;
        let issue = repo.create_issue(&draft(series_id, "Captain Atom 078.cbz", "78")).await.unwrap();
        assert_eq!(issue.slug, "captain-atom-78");
        assert_eq!(issue.status, ReadingStatus::Unread);
        assert_eq!(issue.leaf, 0);
        assert_eq!(issue.cover_date, Some(date!(1965-12-01)));
        assert_eq!(repo.find_issue_by_path("Captain Atom 078.cbz").await.unwrap(), Some(issue.clone()));
        assert_eq!(repo.get_issue(issue.id).await.unwrap(), Some(issue));
    }

    #[tokio::test]
    async fn test_create_issue_conflicts() {
        let (repo, series_id) = setup().await;
        let mut first = draft(series_id, "a.cbz", "1");
        first.cvid = Some(8192);
        repo.create_issue(&first).await.unwrap();

        let err = repo.create_issue(&draft(series_id, "a.cbz", "2")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(_)));
        let mut second = draft(series_id, "b.cbz", "2");
        second.cvid = Some(8192);
        let err = repo.create_issue(&second).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Conflict(_)));
        let err = repo.create_issue(&draft(series_id + 1, "c.cbz", "3")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_numbers_get_distinct_slugs() {
        let (repo, series_id) = setup().await;
        let first = repo.create_issue(&draft(series_id, "a.cbz", "1")).await.unwrap();
        let second = repo.create_issue(&draft(series_id, "b.cbz", "1")).await.unwrap();
        assert_eq!(first.slug, "captain-atom-1");
        assert_eq!(second.slug, "captain-atom-1-1");
    }

    #[tokio::test]
    async fn test_update_keeps_reading_state_and_cover() {
        let (repo, series_id) = setup().await;
        let issue = repo.create_issue(&draft(series_id, "a.cbz", "78")).await.unwrap();
        repo.update_reading_state(issue.id, ReadingStatus::Read, 12).await.unwrap();

        let mut changed = draft(series_id, "moved/a.cbz", "78");
        changed.name = Some("Brother Power".to_string());
        changed.cover = Some("covers/other.png".to_string());
        let updated = repo.update_issue(issue.id, &changed).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Brother Power"));
        assert_eq!(updated.path, PathBuf::from("moved/a.cbz"));
        assert_eq!(updated.status, ReadingStatus::Read);
        assert_eq!(updated.leaf, 12);
        assert_eq!(updated.cover.as_deref(), Some("covers/captain-atom-78.png"));
        assert_eq!(updated.slug, issue.slug);
    }

    #[tokio::test]
    async fn test_update_missing_issue() {
        let (repo, series_id) = setup().await;
        let err = repo.update_issue(42, &draft(series_id, "a.cbz", "1")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
    }

    #[tokio::test]
    async fn test_reading_state_bounds() {
        let (repo, series_id) = setup().await;
        let issue = repo.create_issue(&draft(series_id, "a.cbz", "1")).await.unwrap();
        let err = repo.update_reading_state(issue.id, ReadingStatus::InProgress, 24).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData("leaf")));
        repo.update_reading_state(issue.id, ReadingStatus::InProgress, 23).await.unwrap();
        let issue = repo.get_issue(issue.id).await.unwrap().unwrap();
        assert_eq!((issue.status, issue.leaf), (ReadingStatus::InProgress, 23));
    }

    #[tokio::test]
    async fn test_delete_issue_prunes_orphan_arcs() {
        let (repo, series_id) = setup().await;
        let first = repo.create_issue(&draft(series_id, "a.cbz", "1")).await.unwrap();
        let second = repo.create_issue(&draft(series_id, "b.cbz", "2")).await.unwrap();
        let shared = repo.upsert_entity(EntityKind::Arc, &EntityDraft::named("Shared")).await.unwrap().into_inner();
        let own = repo.upsert_entity(EntityKind::Arc, &EntityDraft::named("Own")).await.unwrap().into_inner();
        repo.set_issue_arcs(first.id, &[shared.id, own.id]).await.unwrap();
        repo.set_issue_arcs(second.id, &[shared.id]).await.unwrap();

        assert!(repo.delete_issue(first.id).await.unwrap());
        assert!(repo.get_entity(EntityKind::Arc, own.id).await.unwrap().is_none());
        assert!(repo.get_entity(EntityKind::Arc, shared.id).await.unwrap().is_some());
        assert!(!repo.delete_issue(first.id).await.unwrap());

        assert!(repo.delete_issue(second.id).await.unwrap());
        assert_eq!(repo.counts().await.unwrap().arcs, 0);
    }
}
