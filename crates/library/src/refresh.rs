//! On-demand refresh of a single record from the catalog.

use crate::error::{Error, ErrorKind, Result};
use crate::reconcile::reconcile;
use crate::remote::issue_metadata;
use crate::{Library, StoreResultExt};
use longbox_catalog::Kind;
use longbox_extract::models::Metadata;
use longbox_extract::remove_articles;
use longbox_store::models::{EntityDraft, EntityKind, IssueDraft, SeriesDraft};
use tracing::instrument;

fn entity_kind(kind: Kind) -> Option<EntityKind> {
    match kind {
        Kind::Publisher => Some(EntityKind::Publisher),
        Kind::Creator => Some(EntityKind::Creator),
        Kind::Arc => Some(EntityKind::Arc),
        Kind::Issue | Kind::Series => None,
    }
}

/// A catalog that can't be reached, or sends nonsense, is not a reason to
/// fail a refresh: the record stays as it is.
fn give_up(kind: Kind, id: u64, err: Error) -> Result<bool> {
    match &*err {
        ErrorKind::RemoteUnavailable | ErrorKind::Catalog => {
            tracing::warn!(%kind, id, error = %*err, "Catalog lookup failed; record left unchanged");
            Ok(false)
        },
        _ => Err(err),
    }
}

impl Library {
    /// Refresh one record from the catalog, by its catalog id.
    ///
    /// Returns `false`, changing nothing, when the library has no record
    /// with that id or the catalog has nothing usable for it. Reading state
    /// is never touched.
    #[instrument(skip(self))]
    pub async fn refresh(&self, kind: Kind, id: u64) -> Result<bool> {
        let result = match kind {
            Kind::Issue => self.refresh_issue(id).await,
            Kind::Series => self.refresh_series(id).await,
            Kind::Publisher | Kind::Creator | Kind::Arc => self.refresh_entity(kind, id).await,
        };
        match result {
            Ok(refreshed) => {
                tracing::info!(refreshed, "Refresh finished");
                Ok(refreshed)
            },
            Err(err) => give_up(kind, id, err),
        }
    }

    async fn refresh_entity(&self, kind: Kind, id: u64) -> Result<bool> {
        let Some(entity_kind) = entity_kind(kind) else {
            return Ok(false);
        };
        let Some(local) = self.store.find_entity_by_cvid(entity_kind, id).await.or_store()? else {
            tracing::debug!("No local record to refresh");
            return Ok(false);
        };
        let Some(remote) = self.lookup_entity(kind, id).await? else {
            return Ok(false);
        };
        let draft = EntityDraft {
            cvid: Some(id),
            name: remote.name.filter(|name| !name.trim().is_empty()).unwrap_or(local.name),
            description: remote.description,
        };
        self.store.upsert_entity(entity_kind, &draft).await.or_store()?;
        Ok(true)
    }

    async fn refresh_series(&self, id: u64) -> Result<bool> {
        let Some(local) = self.store.find_series_by_cvid(id).await.or_store()? else {
            tracing::debug!("No local record to refresh");
            return Ok(false);
        };
        let Some(remote) = self.lookup_series(id).await? else {
            return Ok(false);
        };
        let publisher = match &remote.publisher {
            Some(reference) => self.remote_publisher(reference).await?,
            None => None,
        };
        let name = remote.name.filter(|name| !name.trim().is_empty()).unwrap_or(local.name);
        let draft = SeriesDraft {
            cvid: Some(id),
            publisher_id: publisher.map(|publisher| publisher.id),
            sort_name: remove_articles(&name),
            name,
            description: remote.description,
            volume: None,
            year: remote.start_year,
        };
        self.store.upsert_series(&draft).await.or_store()?;
        Ok(true)
    }

    /// Catalog values win over what's on record; anything the catalog leaves
    /// out is kept.
    async fn refresh_issue(&self, id: u64) -> Result<bool> {
        let Some(local) = self.store.find_issue_by_cvid(id).await.or_store()? else {
            tracing::debug!("No local record to refresh");
            return Ok(false);
        };
        let Some(remote) = self.lookup_issue(id).await? else {
            return Ok(false);
        };
        let recorded = self.recorded_metadata(&local).await?;
        let merged = reconcile(
            Some(&recorded),
            Some(&issue_metadata(&remote)),
            &Metadata::default(),
            &Metadata::default(),
        );
        let series_id = match &remote.series {
            Some(reference) => self.remote_series(reference, &merged).await?.map(|series| series.id),
            None => None,
        };
        let draft = IssueDraft {
            series_id: series_id.unwrap_or(local.series_id),
            number: merged.issue.clone(),
            name: merged.title.clone(),
            description: merged.description.clone(),
            cover_date: merged.cover_date(),
            ..IssueDraft::from_issue(&local)
        };
        let issue = self.store.update_issue(local.id, &draft).await.or_store()?;
        self.save_relations(issue.id, &merged, Some(&remote)).await?;
        Ok(true)
    }
}
