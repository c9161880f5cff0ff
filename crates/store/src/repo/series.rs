use super::{Repository, slug_base, unique_slug};
use crate::error::{ErrorKind, Result};
use crate::models::{Series, SeriesDraft, SeriesParams, SeriesRow, Upsert, cvid_to_row};
use exn::ResultExt;
use time::UtcDateTime;
use tracing::instrument;

impl Repository {
    pub async fn get_series(&self, id: i64) -> Result<Option<Series>> {
        let row: Option<SeriesRow> = sqlx::query_as(include_str!("../../queries/series/get.sql"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Series::try_from).transpose()
    }

    pub async fn find_series_by_cvid(&self, cvid: u64) -> Result<Option<Series>> {
        let row: Option<SeriesRow> = sqlx::query_as(include_str!("../../queries/series/find_by_cvid.sql"))
            .bind(cvid_to_row(Some(cvid))?)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(Series::try_from).transpose()
    }

    /// Create or update a series, matched by external id, then by slug.
    #[instrument(level = "debug", skip_all, fields(name = %draft.name, cvid = ?draft.cvid))]
    pub async fn upsert_series(&self, draft: &SeriesDraft) -> Result<Upsert<Series>> {
        let mut params = SeriesParams::try_from(draft)?;
        let now = UtcDateTime::now().unix_timestamp();
        let base = slug_base(&draft.name);
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;

        let existing: Option<SeriesRow> = match params.cvid {
            Some(cvid) => sqlx::query_as(include_str!("../../queries/series/find_by_cvid.sql"))
                .bind(cvid)
                .fetch_optional(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?,
            None => None,
        };
        let existing = match existing {
            Some(row) => Some(row),
            None => {
                let row: Option<SeriesRow> = sqlx::query_as(include_str!("../../queries/series/find_by_slug.sql"))
                    .bind(&base)
                    .fetch_optional(&mut *tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                row.filter(|row| params.cvid.is_none() || row.cvid.is_none() || row.cvid == params.cvid)
            },
        };

        let upsert = match existing {
            Some(row) => {
                // What the catalog said outranks what a file said; the file
                // only fills gaps.
                if params.cvid.is_none() && row.cvid.is_some() {
                    params.name = row.name;
                    params.sort_name = row.sort_name;
                    params.publisher_id = params.publisher_id.filter(|_| row.publisher_id.is_none());
                    params.description = params.description.filter(|_| row.description.is_none());
                    params.volume = params.volume.filter(|_| row.volume.is_none());
                    params.year = params.year.filter(|_| row.year.is_none());
                }
                let row: SeriesRow = sqlx::query_as(include_str!("../../queries/series/update.sql"))
                    .bind(params.cvid)
                    .bind(params.publisher_id)
                    .bind(params.name)
                    .bind(params.sort_name)
                    .bind(params.description)
                    .bind(params.volume)
                    .bind(params.year)
                    .bind(now)
                    .bind(row.id)
                    .fetch_one(&mut *tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                Upsert::Updated(row)
            },
            None => {
                let slug = unique_slug(&mut tx, "series", &base).await?;
                let row: SeriesRow = sqlx::query_as(include_str!("../../queries/series/insert.sql"))
                    .bind(params.cvid)
                    .bind(params.publisher_id)
                    .bind(params.name)
                    .bind(slug)
                    .bind(params.sort_name)
                    .bind(params.description)
                    .bind(params.volume)
                    .bind(params.year)
                    .bind(now)
                    .fetch_one(&mut *tx)
                    .await
                    .or_raise(|| ErrorKind::Database)?;
                Upsert::Created(row)
            },
        };
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(match upsert {
            Upsert::Created(row) => Upsert::Created(row.try_into()?),
            Upsert::Updated(row) => Upsert::Updated(row.try_into()?),
        })
    }
}
