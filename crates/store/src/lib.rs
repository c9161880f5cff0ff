//! SQLite library database.
//!
//! Holds the reconciled library: publishers, series and issues, plus the
//! creators and story arcs linked to each issue. Unlike the comic files, the
//! database *is* the source of truth for reading state (`status` and `leaf`),
//! which is why nothing in the import path is allowed to write those columns
//! once an issue exists.
//!
//! # Architecture
//! - **Entities** (publishers, creators, arcs) share one shape and one set of
//!   queries, parameterised by table.
//! - **Series** and **Issues** have their own tables and queries.
//! - Every catalog-backed row carries an optional external catalog id
//!   (`cvid`) and a unique slug. Upserts match on the external id first, then
//!   on the slug, and otherwise insert with a suffixed slug.

mod db;
pub mod error;
pub mod models;
mod repo;

pub use crate::db::Database;
pub use crate::repo::Repository;
