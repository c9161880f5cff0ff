//! Library synchronization.
//!
//! A [`Library`] ties together the comics directory, the media directory,
//! the library database and the remote catalog. It runs full imports
//! ([`Library::import`] / [`Library::run_full_import`]) and on-demand
//! refreshes of single records ([`Library::refresh`]), and deletes issues
//! along with their covers ([`Library::delete_issue`]).
//!
//! Archives are processed strictly one after the other: the catalog has a
//! request ceiling, and issues share creator and arc rows.

mod delete;
pub mod error;
mod persist;
mod record;
pub mod reconcile;
mod refresh;
pub mod remote;
pub mod report;
pub mod sync;

pub use crate::reconcile::reconcile;
pub use crate::report::PageReport;
pub use crate::sync::{Failure, ImportEvent, ImportSummary, Outcome, SkipReason};

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use longbox_catalog::CatalogHandle;
use longbox_storage::BackendHandle;
use longbox_storage::backend::ArchiveOnlyBackend;
use longbox_store::Repository;
use std::sync::Arc;

/// Options that change how archives are imported.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Keep leftover filename tokens (scan group, "digital", ...) on issues.
    pub retain_scan_info: bool,
    /// Read every page to record its size in page reports.
    pub calculate_page_sizes: bool,
    /// Served in place of a page that can't be read.
    pub fallback_page: Option<Arc<[u8]>>,
}
impl Default for ImportOptions {
    fn default() -> Self {
        Self { retain_scan_info: true, calculate_page_sizes: false, fallback_page: None }
    }
}

pub struct Library {
    comics: BackendHandle,
    media: BackendHandle,
    store: Repository,
    catalog: CatalogHandle,
    options: ImportOptions,
}

impl Library {
    /// Only comic archives are ever listed or read from `comics`. Covers are
    /// written to `media`.
    pub fn new(comics: BackendHandle, media: BackendHandle, store: Repository, catalog: CatalogHandle) -> Self {
        Self {
            comics: Arc::new(ArchiveOnlyBackend::new(comics)),
            media,
            store,
            catalog,
            options: ImportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn store(&self) -> &Repository {
        &self.store
    }
}

/// Maps library database errors onto [`ErrorKind`], keeping the database
/// error as the cause.
pub(crate) trait StoreResultExt<T> {
    fn or_store(self) -> Result<T>;
}
impl<T> StoreResultExt<T> for longbox_store::error::Result<T> {
    fn or_store(self) -> Result<T> {
        let conflict = match &self {
            Err(err) => match &**err {
                longbox_store::error::ErrorKind::Conflict(message) => Some(message.clone()),
                _ => None,
            },
            Ok(_) => None,
        };
        self.or_raise(|| match conflict {
            Some(message) => ErrorKind::PersistenceConflict(message),
            None => ErrorKind::Store,
        })
    }
}
