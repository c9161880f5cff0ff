use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    str::FromStr,
};

use super::sanitize;
use crate::error::{Error, ErrorKind};

/// Creative role a person held on an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Role {
    Writer,
    Penciller,
    Inker,
    Colorist,
    Letterer,
    CoverArtist,
    Editor,
    /// Catalog sources that don't split pencils from inks.
    Artist,
    Other,
}
impl Role {
    /// Stable lowercase name, used as the role key in the library store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Writer => "writer",
            Role::Penciller => "penciller",
            Role::Inker => "inker",
            Role::Colorist => "colorist",
            Role::Letterer => "letterer",
            Role::CoverArtist => "cover",
            Role::Editor => "editor",
            Role::Artist => "artist",
            Role::Other => "other",
        }
    }

    /// Parse a role name, falling back to [`Role::Other`] for anything unknown.
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or(Role::Other)
    }
}
impl FromStr for Role {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let sanitized = sanitize(s);
        Ok(match sanitized.as_str() {
            "writer" | "script" | "plot" | "story" => Self::Writer,
            "penciller" | "penciler" | "pencils" => Self::Penciller,
            "inker" | "inks" => Self::Inker,
            "colorist" | "colourist" | "colors" | "colours" => Self::Colorist,
            "letterer" | "letters" => Self::Letterer,
            "cover" | "coverartist" | "covers" => Self::CoverArtist,
            "editor" | "editing" => Self::Editor,
            "artist" | "art" => Self::Artist,
            "other" => Self::Other,
            _ => exn::bail!(ErrorKind::ParseError {
                field: "role",
                value: format!("unknown role: {}", s)
            }),
        })
    }
}
impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// One person credited in one role.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credit {
    pub person: String,
    pub role: Role,
}
impl Credit {
    pub fn new(person: impl Into<String>, role: Role) -> Self {
        Self { person: person.into(), role }
    }
}
