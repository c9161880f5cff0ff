//! Library models and their database rows.
//!
//! The public types are what callers work with. Each has a crate-private
//! `*Row` twin that mirrors the table columns, converted with `TryFrom`.

mod entity;
mod issue;
mod series;

pub use self::entity::{Entity, EntityDraft, EntityKind};
pub(crate) use self::entity::EntityRow;
pub use self::issue::{Issue, IssueDraft, ReadingStatus};
pub(crate) use self::issue::{IssueParams, IssueRow};
pub use self::series::{Series, SeriesDraft};
pub(crate) use self::series::{SeriesParams, SeriesRow};

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use time::UtcDateTime;

/// Outcome of an upsert: whether a new row was inserted or an existing one
/// was matched and updated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert<T> {
    Created(T),
    Updated(T),
}
impl<T> Upsert<T> {
    pub fn is_created(&self) -> bool {
        matches!(self, Self::Created(_))
    }

    pub fn get(&self) -> &T {
        match self {
            Self::Created(inner) | Self::Updated(inner) => inner,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Self::Created(inner) | Self::Updated(inner) => inner,
        }
    }
}

/// A creator credited on an issue, with every role they held on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub creator: Entity,
    pub roles: Vec<String>,
}

/// Input for [`Repository::set_issue_credits`](crate::Repository::set_issue_credits).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreditDraft {
    pub creator_id: i64,
    pub roles: Vec<String>,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, sqlx::FromRow)]
pub struct Counts {
    pub publishers: i64,
    pub series: i64,
    pub issues: i64,
    pub creators: i64,
    pub arcs: i64,
    pub roles: i64,
}

pub(crate) fn cvid_to_row(cvid: Option<u64>) -> Result<Option<i64>> {
    cvid.map(|id| i64::try_from(id).or_raise(|| ErrorKind::InvalidData("external id"))).transpose()
}

pub(crate) fn cvid_from_row(cvid: Option<i64>) -> Result<Option<u64>> {
    cvid.map(|id| u64::try_from(id).or_raise(|| ErrorKind::InvalidData("external id"))).transpose()
}

pub(crate) fn timestamp_from_row(timestamp: i64, field: &'static str) -> Result<UtcDateTime> {
    UtcDateTime::from_unix_timestamp(timestamp).or_raise(|| ErrorKind::InvalidData(field))
}
