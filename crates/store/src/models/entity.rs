use super::{cvid_from_row, timestamp_from_row};
use crate::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};
use time::UtcDateTime;

/// The catalog-backed records that share a single table shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Publisher,
    Creator,
    Arc,
}
impl EntityKind {
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Self::Publisher => "publishers",
            Self::Creator => "creators",
            Self::Arc => "arcs",
        }
    }
}
impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self {
            Self::Publisher => "publisher",
            Self::Creator => "creator",
            Self::Arc => "arc",
        })
    }
}

/// A publisher, creator or story arc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: i64,
    pub cvid: Option<u64>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub modified_at: UtcDateTime,
}

/// Values for creating or updating an [`Entity`].
///
/// A `None` description keeps whatever is already on record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityDraft {
    pub cvid: Option<u64>,
    pub name: String,
    pub description: Option<String>,
}
impl EntityDraft {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntityRow {
    pub id: i64,
    pub cvid: Option<i64>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub modified_at: i64,
}
impl TryFrom<EntityRow> for Entity {
    type Error = Error;
    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            cvid: cvid_from_row(row.cvid)?,
            name: row.name,
            slug: row.slug,
            description: row.description,
            modified_at: timestamp_from_row(row.modified_at, "modification date")?,
        })
    }
}
