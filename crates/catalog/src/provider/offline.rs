use crate::error::Result;
use crate::models::{Fragment, Kind};
use crate::provider::Catalog;
use async_trait::async_trait;

/// Catalog that never knows anything. Used when no catalog is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineCatalog;

#[async_trait]
impl Catalog for OfflineCatalog {
    fn name(&self) -> &str {
        "offline"
    }

    async fn lookup(&self, kind: Kind, id: u64) -> Result<Option<Fragment>> {
        tracing::trace!(%kind, id, "Offline catalog lookup");
        Ok(None)
    }
}
