//! Deadline decorator for catalogs.

use crate::CatalogHandle;
use crate::error::{ErrorKind, Result};
use crate::models::{Fragment, Kind};
use crate::provider::Catalog;
use async_trait::async_trait;
use std::time::Duration;

/// Wraps another catalog and fails any lookup that takes longer than the
/// configured duration with [`Timeout`](ErrorKind::Timeout).
#[derive(Clone)]
pub struct TimeoutCatalog {
    inner: CatalogHandle,
    timeout: Duration,
}
impl TimeoutCatalog {
    pub fn new(inner: CatalogHandle, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl Catalog for TimeoutCatalog {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn lookup(&self, kind: Kind, id: u64) -> Result<Option<Fragment>> {
        match tokio::time::timeout(self.timeout, self.inner.lookup(kind, id)).await {
            Ok(result) => result,
            Err(_elapsed) => {
                tracing::warn!(catalog = self.inner.name(), %kind, id, timeout = ?self.timeout, "Catalog lookup timed out");
                exn::bail!(ErrorKind::Timeout)
            },
        }
    }
}
