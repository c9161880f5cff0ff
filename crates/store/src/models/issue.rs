use super::{cvid_from_row, cvid_to_row, timestamp_from_row};
use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use time::{Date, UtcDateTime};

/// Where a reader is with an issue. Owned by the reader, never by imports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ReadingStatus {
    #[default]
    Unread,
    InProgress,
    Read,
}
impl ReadingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unread => "unread",
            Self::InProgress => "in_progress",
            Self::Read => "read",
        }
    }
}
impl FromStr for ReadingStatus {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "unread" => Self::Unread,
            "in_progress" => Self::InProgress,
            "read" => Self::Read,
            _ => exn::bail!(ErrorKind::InvalidData("reading status")),
        })
    }
}
impl Display for ReadingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A single comic archive in the library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: i64,
    pub cvid: Option<u64>,
    pub series_id: i64,
    pub slug: String,
    /// Issue number as printed ("1", "0.5", "12AU")
    pub number: Option<String>,
    /// Story title
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover_date: Option<Date>,
    pub scan_info: Option<String>,
    /// Path of the archive, relative to the comics directory
    pub path: PathBuf,
    pub file_size: u64,
    pub file_modified: UtcDateTime,
    pub page_count: usize,
    /// Path of the cover image, relative to the media directory
    pub cover: Option<String>,
    pub status: ReadingStatus,
    /// Zero-based index of the page the reader is on
    pub leaf: usize,
    pub imported_at: UtcDateTime,
    pub modified_at: UtcDateTime,
}

impl Issue {
    /// Display name within its series.
    ///
    /// Whole issue numbers are zero-padded to three digits
    /// (`Captain Atom #078`); anything else is used as-is.
    pub fn display_name(&self, series_name: &str) -> String {
        match self.number.as_deref() {
            Some(number) => match number.parse::<u32>() {
                Ok(n) => format!("{series_name} #{n:03}"),
                Err(_) => format!("{series_name} #{number}"),
            },
            None => match &self.name {
                Some(name) => format!("{series_name}: {name}"),
                None => series_name.to_string(),
            },
        }
    }

    /// Percentage of the issue read, rounded down.
    pub fn percent_read(&self) -> u8 {
        if self.page_count == 0 {
            return 0;
        }
        (self.leaf.min(self.page_count) * 100 / self.page_count) as u8
    }

    /// `true` if the archive on disk still looks like the one imported.
    pub fn is_unchanged(&self, size: u64, modified: UtcDateTime) -> bool {
        self.file_size == size && self.file_modified.unix_timestamp() == modified.unix_timestamp()
    }
}

/// Values for creating or updating an [`Issue`].
///
/// Reading state is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDraft {
    pub cvid: Option<u64>,
    pub series_id: i64,
    pub number: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover_date: Option<Date>,
    pub scan_info: Option<String>,
    pub path: PathBuf,
    pub file_size: u64,
    pub file_modified: UtcDateTime,
    pub page_count: usize,
    /// Only written when the issue has no cover yet.
    pub cover: Option<String>,
}
impl IssueDraft {
    /// Draft that rewrites an existing issue unchanged.
    pub fn from_issue(issue: &Issue) -> Self {
        Self {
            cvid: issue.cvid,
            series_id: issue.series_id,
            number: issue.number.clone(),
            name: issue.name.clone(),
            description: issue.description.clone(),
            cover_date: issue.cover_date,
            scan_info: issue.scan_info.clone(),
            path: issue.path.clone(),
            file_size: issue.file_size,
            file_modified: issue.file_modified,
            page_count: issue.page_count,
            cover: issue.cover.clone(),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct IssueRow {
    pub id: i64,
    pub cvid: Option<i64>,
    pub series_id: i64,
    pub slug: String,
    pub number: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover_date: Option<i64>,
    pub scan_info: Option<String>,
    pub path: String,
    pub file_size: i64,
    pub file_modified: i64,
    pub page_count: i64,
    pub cover: Option<String>,
    pub status: String,
    pub leaf: i64,
    pub imported_at: i64,
    pub modified_at: i64,
}
impl TryFrom<IssueRow> for Issue {
    type Error = Error;
    fn try_from(row: IssueRow) -> Result<Self, Self::Error> {
        let cover_date = row
            .cover_date
            .map(|day| {
                let day = i32::try_from(day).or_raise(|| ErrorKind::InvalidData("cover date"))?;
                Date::from_julian_day(day).or_raise(|| ErrorKind::InvalidData("cover date"))
            })
            .transpose()?;
        Ok(Self {
            id: row.id,
            cvid: cvid_from_row(row.cvid)?,
            series_id: row.series_id,
            slug: row.slug,
            number: row.number,
            name: row.name,
            description: row.description,
            cover_date,
            scan_info: row.scan_info,
            path: PathBuf::from(row.path),
            file_size: u64::try_from(row.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            file_modified: timestamp_from_row(row.file_modified, "file modification date")?,
            page_count: usize::try_from(row.page_count).or_raise(|| ErrorKind::InvalidData("page count"))?,
            cover: row.cover,
            status: row.status.parse()?,
            leaf: usize::try_from(row.leaf).or_raise(|| ErrorKind::InvalidData("leaf"))?,
            imported_at: timestamp_from_row(row.imported_at, "import date")?,
            modified_at: timestamp_from_row(row.modified_at, "modification date")?,
        })
    }
}

/// Bind values for the issue insert/update queries.
pub(crate) struct IssueParams {
    pub cvid: Option<i64>,
    pub series_id: i64,
    pub number: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover_date: Option<i32>,
    pub scan_info: Option<String>,
    pub path: String,
    pub file_size: i64,
    pub file_modified: i64,
    pub page_count: i64,
    pub cover: Option<String>,
}
impl TryFrom<&IssueDraft> for IssueParams {
    type Error = Error;
    fn try_from(draft: &IssueDraft) -> Result<Self, Self::Error> {
        Ok(Self {
            cvid: cvid_to_row(draft.cvid)?,
            series_id: draft.series_id,
            number: draft.number.clone(),
            name: draft.name.clone(),
            description: draft.description.clone(),
            cover_date: draft.cover_date.map(|date| date.to_julian_day()),
            scan_info: draft.scan_info.clone(),
            path: draft.path.to_str().ok_or_raise(|| ErrorKind::InvalidData("path"))?.to_string(),
            file_size: i64::try_from(draft.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
            file_modified: draft.file_modified.unix_timestamp(),
            page_count: i64::try_from(draft.page_count).or_raise(|| ErrorKind::InvalidData("page count"))?,
            cover: draft.cover.clone(),
        })
    }
}
