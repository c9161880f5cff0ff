//! Saving parents (publishers, series) and relations (credits, arcs).
//!
//! Catalog lookups for parents always happen before the first write, so a
//! failed lookup leaves the library as it was.

use crate::error::Result;
use crate::{Library, StoreResultExt};
use longbox_catalog::{IssueFragment, Kind, Reference};
use longbox_extract::models::Metadata;
use longbox_extract::remove_articles;
use longbox_store::models::{CreditDraft, Entity, EntityDraft, EntityKind, Series, SeriesDraft};
use tracing::instrument;

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

impl Library {
    /// The publisher a catalog record points at, fetched and saved if it
    /// isn't in the library yet. `None` when the catalog can't name it.
    pub(crate) async fn remote_publisher(&self, reference: &Reference) -> Result<Option<Entity>> {
        if let Some(publisher) = self.store.find_entity_by_cvid(EntityKind::Publisher, reference.id).await.or_store()? {
            return Ok(Some(publisher));
        }
        let fragment = self.lookup_entity(Kind::Publisher, reference.id).await?.unwrap_or_default();
        let Some(name) = non_blank(fragment.name.as_deref()).or(non_blank(reference.name.as_deref())) else {
            tracing::debug!(cvid = reference.id, "Catalog has no name for publisher");
            return Ok(None);
        };
        let draft = EntityDraft { cvid: Some(reference.id), name: name.to_string(), description: fragment.description };
        Ok(Some(self.store.upsert_entity(EntityKind::Publisher, &draft).await.or_store()?.into_inner()))
    }

    /// The series a catalog issue points at, fetched and saved (with its
    /// publisher) if it isn't in the library yet.
    ///
    /// `merged` supplies the name when the catalog has none, and the volume,
    /// which the catalog doesn't track. `None` when no name is known at all.
    #[instrument(level = "debug", skip_all, fields(cvid = reference.id))]
    pub(crate) async fn remote_series(&self, reference: &Reference, merged: &Metadata) -> Result<Option<Series>> {
        if let Some(series) = self.store.find_series_by_cvid(reference.id).await.or_store()? {
            return Ok(Some(series));
        }
        let fragment = self.lookup_series(reference.id).await?.unwrap_or_default();
        let Some(name) = non_blank(fragment.name.as_deref())
            .or(non_blank(reference.name.as_deref()))
            .or(non_blank(merged.series.as_deref()))
            .map(String::from)
        else {
            return Ok(None);
        };
        let publisher = match &fragment.publisher {
            Some(reference) => self.remote_publisher(reference).await?,
            None => None,
        };
        let draft = SeriesDraft {
            cvid: Some(reference.id),
            publisher_id: publisher.map(|publisher| publisher.id),
            sort_name: remove_articles(&name),
            name,
            description: fragment.description,
            volume: merged.volume,
            year: fragment.start_year,
        };
        Ok(Some(self.store.upsert_series(&draft).await.or_store()?.into_inner()))
    }

    /// A series known only from local metadata, matched to an existing one
    /// by name.
    pub(crate) async fn local_series(&self, name: &str, merged: &Metadata) -> Result<Series> {
        let publisher = match non_blank(merged.publisher.as_deref()) {
            Some(name) => {
                let draft = EntityDraft::named(name);
                Some(self.store.upsert_entity(EntityKind::Publisher, &draft).await.or_store()?.into_inner())
            },
            None => None,
        };
        let draft = SeriesDraft {
            cvid: None,
            publisher_id: publisher.map(|publisher| publisher.id),
            name: name.to_string(),
            sort_name: remove_articles(name),
            description: None,
            volume: merged.volume,
            year: None,
        };
        Ok(self.store.upsert_series(&draft).await.or_store()?.into_inner())
    }

    /// Replace an issue's credits and arcs with the merged ones.
    ///
    /// Creators and arcs the catalog named keep their catalog id, so later
    /// refreshes can find them.
    pub(crate) async fn save_relations(
        &self,
        issue_id: i64,
        merged: &Metadata,
        remote: Option<&IssueFragment>,
    ) -> Result<()> {
        let mut grouped: Vec<(&str, Vec<String>)> = Vec::new();
        for credit in &merged.credits {
            let role = credit.role.as_str().to_string();
            match grouped.iter_mut().find(|(person, _)| *person == credit.person) {
                Some((_, roles)) => roles.push(role),
                None => grouped.push((credit.person.as_str(), vec![role])),
            }
        }
        let mut credits = Vec::with_capacity(grouped.len());
        for (person, roles) in grouped {
            let cvid = remote
                .and_then(|issue| {
                    issue.credits.iter().find(|credit| non_blank(credit.person.name.as_deref()) == Some(person))
                })
                .map(|credit| credit.person.id);
            let draft = EntityDraft { cvid, ..EntityDraft::named(person) };
            let creator = self.store.upsert_entity(EntityKind::Creator, &draft).await.or_store()?;
            credits.push(CreditDraft { creator_id: creator.get().id, roles });
        }
        self.store.set_issue_credits(issue_id, &credits).await.or_store()?;

        let mut arcs = Vec::with_capacity(merged.story_arcs.len());
        for name in merged.story_arcs.iter().filter_map(|name| non_blank(Some(name.as_str()))) {
            let cvid = remote
                .and_then(|issue| issue.arcs.iter().find(|arc| non_blank(arc.name.as_deref()) == Some(name)))
                .map(|arc| arc.id);
            let draft = EntityDraft { cvid, ..EntityDraft::named(name) };
            arcs.push(self.store.upsert_entity(EntityKind::Arc, &draft).await.or_store()?.get().id);
        }
        self.store.set_issue_arcs(issue_id, &arcs).await.or_store()
    }
}
