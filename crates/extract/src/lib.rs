//! Comic metadata: the canonical [`Metadata`](models::Metadata) model and the
//! two local sources that populate it.
//!
//! - [`comicinfo::parse`] reads an embedded ComicRack `ComicInfo.xml`.
//! - [`filename::parse`] infers what it can from the archive's filename.
//!
//! Neither source knows how many pages an archive really has; the archive
//! reader reconciles that afterwards.

pub mod comicinfo;
mod consts;
pub mod error;
pub mod filename;
pub mod models;
mod text;

pub use crate::consts::COMICINFO_FILENAME;
pub use crate::text::remove_articles;
