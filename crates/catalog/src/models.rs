//! Catalog record kinds and the fragments a lookup returns.

use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use time::Date;

/// Kind of library record that can be looked up (and refreshed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Publisher,
    Series,
    Issue,
    Creator,
    Arc,
}
impl Kind {
    pub const ALL: [Kind; 5] = [Kind::Publisher, Kind::Series, Kind::Issue, Kind::Creator, Kind::Arc];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Publisher => "publisher",
            Kind::Series => "series",
            Kind::Issue => "issue",
            Kind::Creator => "creator",
            Kind::Arc => "arc",
        }
    }
}
impl FromStr for Kind {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "publisher" | "publishers" => Kind::Publisher,
            "series" => Kind::Series,
            "issue" | "issues" => Kind::Issue,
            "creator" | "creators" | "person" | "people" => Kind::Creator,
            "arc" | "arcs" | "story_arc" | "story-arc" => Kind::Arc,
            _ => exn::bail!(ErrorKind::UnknownKind(s.to_string())),
        })
    }
}
impl Display for Kind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Pointer from one catalog record to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
}

/// One person credited on an issue, possibly in several roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditFragment {
    pub person: Reference,
    /// Free-form role names ("writer", "penciler, inker").
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IssueFragment {
    pub id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub number: Option<String>,
    pub cover_date: Option<Date>,
    pub series: Option<Reference>,
    pub credits: Vec<CreditFragment>,
    pub arcs: Vec<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesFragment {
    pub id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_year: Option<i32>,
    pub publisher: Option<Reference>,
}

/// Publishers, creators and arcs only carry a name and a description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityFragment {
    pub id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Partial record returned by a catalog lookup. Every field is optional: the
/// catalog only fills in what it knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Issue(IssueFragment),
    Series(SeriesFragment),
    Entity(EntityFragment),
}
impl Fragment {
    pub fn id(&self) -> u64 {
        match self {
            Fragment::Issue(issue) => issue.id,
            Fragment::Series(series) => series.id,
            Fragment::Entity(entity) => entity.id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Fragment::Issue(issue) => issue.name.as_deref(),
            Fragment::Series(series) => series.name.as_deref(),
            Fragment::Entity(entity) => entity.name.as_deref(),
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Fragment::Issue(issue) => issue.description.as_deref(),
            Fragment::Series(series) => series.description.as_deref(),
            Fragment::Entity(entity) => entity.description.as_deref(),
        }
    }

    /// `true` when the fragment has the shape expected for `kind`.
    pub fn matches(&self, kind: Kind) -> bool {
        matches!(
            (self, kind),
            (Fragment::Issue(_), Kind::Issue)
                | (Fragment::Series(_), Kind::Series)
                | (Fragment::Entity(_), Kind::Publisher | Kind::Creator | Kind::Arc)
        )
    }

    /// Decode the JSON body of a record of the given kind.
    pub fn from_json(kind: Kind, json: &[u8]) -> serde_json::Result<Self> {
        Ok(match kind {
            Kind::Issue => Fragment::Issue(serde_json::from_slice(json)?),
            Kind::Series => Fragment::Series(serde_json::from_slice(json)?),
            Kind::Publisher | Kind::Creator | Kind::Arc => Fragment::Entity(serde_json::from_slice(json)?),
        })
    }

    pub fn into_issue(self) -> Option<IssueFragment> {
        match self {
            Fragment::Issue(issue) => Some(issue),
            _ => None,
        }
    }

    pub fn into_series(self) -> Option<SeriesFragment> {
        match self {
            Fragment::Series(series) => Some(series),
            _ => None,
        }
    }

    pub fn into_entity(self) -> Option<EntityFragment> {
        match self {
            Fragment::Entity(entity) => Some(entity),
            _ => None,
        }
    }
}
