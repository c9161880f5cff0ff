use super::{cvid_from_row, cvid_to_row, timestamp_from_row};
use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use time::UtcDateTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Series {
    pub id: i64,
    pub cvid: Option<u64>,
    pub publisher_id: Option<i64>,
    pub name: String,
    pub slug: String,
    /// Lowercased name without leading articles or punctuation
    pub sort_name: String,
    pub description: Option<String>,
    pub volume: Option<u32>,
    /// Year the series started
    pub year: Option<i32>,
    pub modified_at: UtcDateTime,
}

/// Values for creating or updating a [`Series`].
///
/// `None` for the publisher, description, volume or year keeps whatever is
/// already on record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesDraft {
    pub cvid: Option<u64>,
    pub publisher_id: Option<i64>,
    pub name: String,
    pub sort_name: String,
    pub description: Option<String>,
    pub volume: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct SeriesRow {
    pub id: i64,
    pub cvid: Option<i64>,
    pub publisher_id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub sort_name: String,
    pub description: Option<String>,
    pub volume: Option<i64>,
    pub year: Option<i64>,
    pub modified_at: i64,
}
impl TryFrom<SeriesRow> for Series {
    type Error = Error;
    fn try_from(row: SeriesRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            cvid: cvid_from_row(row.cvid)?,
            publisher_id: row.publisher_id,
            name: row.name,
            slug: row.slug,
            sort_name: row.sort_name,
            description: row.description,
            volume: row
                .volume
                .map(|v| u32::try_from(v).or_raise(|| ErrorKind::InvalidData("volume")))
                .transpose()?,
            year: row.year.map(|y| i32::try_from(y).or_raise(|| ErrorKind::InvalidData("year"))).transpose()?,
            modified_at: timestamp_from_row(row.modified_at, "modification date")?,
        })
    }
}

/// Bind values for the series insert/update queries.
pub(crate) struct SeriesParams {
    pub cvid: Option<i64>,
    pub publisher_id: Option<i64>,
    pub name: String,
    pub sort_name: String,
    pub description: Option<String>,
    pub volume: Option<i64>,
    pub year: Option<i64>,
}
impl TryFrom<&SeriesDraft> for SeriesParams {
    type Error = Error;
    fn try_from(draft: &SeriesDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            cvid: cvid_to_row(draft.cvid)?,
            publisher_id: draft.publisher_id,
            name: draft.name.clone(),
            sort_name: draft.sort_name.clone(),
            description: draft.description.clone(),
            volume: draft.volume.map(i64::from),
            year: draft.year.map(i64::from),
        })
    }
}
