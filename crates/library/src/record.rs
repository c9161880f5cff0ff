//! What the library already knows about an issue, as metadata.

use crate::error::Result;
use crate::{Library, StoreResultExt};
use longbox_extract::models::{Credit, Metadata, Role};
use longbox_store::models::{EntityKind, Issue};

impl Library {
    /// Metadata for an issue as recorded in the library, including its
    /// series, publisher, credits and arcs.
    pub(crate) async fn recorded_metadata(&self, issue: &Issue) -> Result<Metadata> {
        let series = self.store.get_series(issue.series_id).await.or_store()?;
        let publisher = match series.as_ref().and_then(|series| series.publisher_id) {
            Some(id) => self.store.get_entity(EntityKind::Publisher, id).await.or_store()?,
            None => None,
        };
        let credits = self.store.issue_credits(issue.id).await.or_store()?;
        let arcs = self.store.issue_arcs(issue.id).await.or_store()?;

        let mut metadata = Metadata {
            series: series.as_ref().map(|series| series.name.clone()),
            issue: issue.number.clone(),
            volume: series.as_ref().and_then(|series| series.volume),
            year: issue.cover_date.map(|date| date.year()),
            month: issue.cover_date.map(|date| u8::from(date.month())),
            day: issue.cover_date.map(|date| date.day()),
            title: issue.name.clone(),
            description: issue.description.clone(),
            publisher: publisher.map(|publisher| publisher.name),
            scan_info: issue.scan_info.clone(),
            credits: credits
                .iter()
                .flat_map(|credit| {
                    credit.roles.iter().map(|role| Credit::new(credit.creator.name.clone(), Role::parse_lenient(role)))
                })
                .collect(),
            story_arcs: arcs.into_iter().map(|arc| arc.name).collect(),
            ..Default::default()
        };
        metadata.reconcile_page_count(issue.page_count);
        Ok(metadata)
    }
}
