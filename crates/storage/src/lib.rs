//! Storage backends for the comic library.
//!
//! The library directory is read through an [`ArchiveOnlyBackend`] so that
//! listing only ever yields comic archives, while generated media (covers)
//! is written through a plain [`LocalBackend`].
//!
//! [`ArchiveOnlyBackend`]: crate::backend::ArchiveOnlyBackend
//! [`LocalBackend`]: crate::backend::LocalBackend

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

/// Shared handle to any backend (or decorated backend).
pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
