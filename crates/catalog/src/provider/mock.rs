//! In-memory catalog for testing.

use crate::error::{ErrorKind, Result};
use crate::models::{Fragment, Kind};
use crate::provider::Catalog;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory catalog for testing.
///
/// Serves fragments registered up front (or later via [`insert`](Self::insert)),
/// can be told to fail specific lookups, and records every lookup it
/// receives so tests can assert on what was (not) fetched.
///
/// # Examples
///
/// ```
/// use longbox_catalog::{Catalog, EntityFragment, Fragment, Kind, provider::MockCatalog};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let dc = Fragment::Entity(EntityFragment { id: 10, name: Some("DC Comics".into()), description: None });
/// let catalog = MockCatalog::default().with_fragment(Kind::Publisher, dc.clone());
/// assert_eq!(catalog.lookup(Kind::Publisher, 10).await.unwrap(), Some(dc));
/// assert_eq!(catalog.lookups().await, vec![(Kind::Publisher, 10)]);
/// # }
/// ```
#[derive(Default)]
pub struct MockCatalog {
    fragments: RwLock<HashMap<(Kind, u64), Fragment>>,
    failures: RwLock<HashMap<(Kind, u64), ErrorKind>>,
    lookups: RwLock<Vec<(Kind, u64)>>,
    delay: Option<Duration>,
}

impl MockCatalog {
    /// Register a fragment. Panics if the fragment's shape doesn't match
    /// `kind`: if test setup is wrong, then test should not pass.
    pub fn with_fragment(mut self, kind: Kind, fragment: Fragment) -> Self {
        if !fragment.matches(kind) {
            panic!("MockCatalog::with_fragment: fragment {} is not a {kind}", fragment.id());
        }
        self.fragments.get_mut().insert((kind, fragment.id()), fragment);
        self
    }

    /// Make every lookup of `(kind, id)` fail with `error`.
    pub fn with_failure(mut self, kind: Kind, id: u64, error: ErrorKind) -> Self {
        self.failures.get_mut().insert((kind, id), error);
        self
    }

    /// Delay every lookup (use with paused tokio time).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Replace (or add) a fragment after construction.
    pub async fn insert(&self, kind: Kind, fragment: Fragment) {
        self.fragments.write().await.insert((kind, fragment.id()), fragment);
    }

    /// Stop failing lookups of `(kind, id)`.
    pub async fn recover(&self, kind: Kind, id: u64) {
        self.failures.write().await.remove(&(kind, id));
    }

    /// Every lookup received so far, in order.
    pub async fn lookups(&self) -> Vec<(Kind, u64)> {
        self.lookups.read().await.clone()
    }
}

#[async_trait]
impl Catalog for MockCatalog {
    fn name(&self) -> &str {
        "mock"
    }

    async fn lookup(&self, kind: Kind, id: u64) -> Result<Option<Fragment>> {
        self.lookups.write().await.push((kind, id));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.failures.read().await.get(&(kind, id)) {
            exn::bail!(error.clone());
        }
        Ok(self.fragments.read().await.get(&(kind, id)).cloned())
    }
}
