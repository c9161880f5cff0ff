//! Catalog trait and implementations.

mod directory;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod offline;
mod timeout;

pub use self::directory::DirectoryCatalog;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockCatalog;
pub use self::offline::OfflineCatalog;
pub use self::timeout::TimeoutCatalog;
use crate::error::Result;
use crate::models::{Fragment, Kind};
use async_trait::async_trait;

/// Read-only access to a remote comic catalog.
///
/// # Examples
///
/// ```
/// use longbox_catalog::{Catalog, Kind, error::Result};
///
/// async fn series_name(catalog: &dyn Catalog, id: u64) -> Result<Option<String>> {
///     let fragment = catalog.lookup(Kind::Series, id).await?;
///     Ok(fragment.and_then(|f| f.name().map(String::from)))
/// }
/// ```
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Name of the catalog, for logging.
    fn name(&self) -> &str;

    /// Look up a single record by its external identifier.
    ///
    /// Returns `Ok(None)` when the catalog has no such record. Errors are
    /// reserved for lookups that couldn't be answered (see
    /// [`ErrorKind::is_retryable`](crate::error::ErrorKind::is_retryable)).
    /// A returned fragment always has the shape expected for `kind`.
    async fn lookup(&self, kind: Kind, id: u64) -> Result<Option<Fragment>>;
}
