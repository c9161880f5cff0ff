//! Remote comic catalog lookups.
//!
//! The catalog is where authoritative names, descriptions and relationships
//! come from. It is only ever consulted one record at a time, by external
//! identifier, through the [`Catalog`] trait:
//!
//! - [`OfflineCatalog`](provider::OfflineCatalog) knows nothing; imports fall
//!   back to embedded and filename metadata.
//! - [`DirectoryCatalog`](provider::DirectoryCatalog) serves records from a
//!   tree of JSON files (`<root>/<kind>/<id>.json`), e.g. a mirrored dump.
//! - [`TimeoutCatalog`](provider::TimeoutCatalog) bounds another catalog's
//!   lookups by a deadline.

pub mod error;
mod models;
pub mod provider;

pub use crate::models::{CreditFragment, EntityFragment, Fragment, IssueFragment, Kind, Reference, SeriesFragment};
pub use crate::provider::Catalog;
use std::sync::Arc;

/// Shared handle to any catalog (or decorated catalog).
pub type CatalogHandle = Arc<dyn Catalog + Send + Sync>;
