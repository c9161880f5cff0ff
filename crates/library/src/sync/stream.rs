use crate::Library;
use crate::error::{Error, ErrorKind, Result};
use crate::sync::{ImportSummary, Outcome};
use async_stream::stream;
use exn::ResultExt;
use futures::{Stream, StreamExt};
use std::path::PathBuf;
use std::pin::pin;
use tracing::instrument;

/// Progress events emitted by [`Library::import`] as it works through the
/// comics directory.
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete): exactly once, with the
///    number of archives found.
/// 3. [`Processed`](Self::Processed) or [`Failed`](Self::Failed): once per
///    archive, in path order.
/// 4. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
///
/// Only a failure to list the comics directory ends the stream early (as an
/// `Err` item), in which case [`Complete`](Self::Complete) is never emitted.
pub enum ImportEvent {
    /// Importing has begun; emitted exactly once before any other event.
    Started,
    /// The comics directory has been listed; the archive count is now known.
    DiscoveryComplete(u64),
    /// An archive was imported, found unchanged or skipped.
    Processed { path: PathBuf, outcome: Outcome },
    /// An archive couldn't be imported. The rest of the run carries on.
    Failed { path: PathBuf, error: Error },
    /// Every discovered archive has been handled; the stream is finished.
    Complete,
}

impl Library {
    /// Streams [`ImportEvent`]s for every comic archive in the comics
    /// directory.
    ///
    /// Archives are handled one at a time, sorted by path, so runs over the
    /// same directory always go the same way.
    pub fn import(&self) -> impl Stream<Item = Result<ImportEvent>> + '_ {
        stream!({
            yield Ok(ImportEvent::Started);

            let mut files = match self.comics.list(None).await.or_raise(|| ErrorKind::Storage) {
                Ok(files) => files,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            files.sort_by(|a, b| a.path.cmp(&b.path));
            // usize always fits in u64 on supported targets.
            yield Ok(ImportEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(0)));

            for file in files {
                let path = file.path.clone();
                match self.import_file(file).await {
                    Ok(outcome) => {
                        yield Ok(ImportEvent::Processed { path, outcome });
                    },
                    Err(error) => {
                        tracing::warn!(path = %path.display(), error = %*error, "Failed to import archive");
                        yield Ok(ImportEvent::Failed { path, error });
                    },
                }
            }

            yield Ok(ImportEvent::Complete);
        })
    }

    /// Import every archive in the comics directory and tally the results.
    ///
    /// Per-archive failures are recorded in the summary; only a failure to
    /// list the comics directory is returned as an error.
    #[instrument(skip_all, fields(comics = self.comics.name()))]
    pub async fn run_full_import(&self) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();
        let mut events = pin!(self.import());
        while let Some(event) = events.next().await {
            let event = event?;
            if let ImportEvent::DiscoveryComplete(count) = &event {
                tracing::info!(count, "Discovered archives");
            }
            summary.record(&event);
        }
        tracing::info!(%summary, "Import complete");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Failure;
    use crate::sync::SkipReason;
    use crate::tests::fixture;
    use longbox_archive::mock::{build_comic, build_zip, fake_page};
    use longbox_catalog::error::ErrorKind as CatalogErrorKind;
    use longbox_catalog::provider::MockCatalog;
    use longbox_catalog::{CreditFragment, EntityFragment, Fragment, IssueFragment, Kind, Reference, SeriesFragment};
    use longbox_storage::StorageBackend;
    use longbox_store::models::{Counts, EntityKind, ReadingStatus};
    use std::path::Path;
    use time::macros::{date, utc_datetime};

    const BATMAN: &str = "<ComicInfo><Series>Batman</Series><Number>713</Number><Year>2011</Year><Month>10</Month>\
        <Publisher>DC Comics</Publisher><Writer>Tony Daniel</Writer><Penciller>Tony Daniel</Penciller>\
        <StoryArc>Night of the Owls</StoryArc></ComicInfo>";

    fn captain_atom(number: u32, cvid: u64) -> String {
        format!(
            "<ComicInfo><Series>Capt. Atom</Series><Number>{number}</Number><Title>Embedded title</Title>\
             <Year>1966</Year><Notes>Scraped metadata from ComicVine [CVDB{cvid}]</Notes></ComicInfo>"
        )
    }

    fn charlton() -> MockCatalog {
        MockCatalog::default()
            .with_fragment(
                Kind::Issue,
                Fragment::Issue(IssueFragment {
                    id: 8192,
                    name: Some("The Ghost".to_string()),
                    number: Some("78".to_string()),
                    cover_date: Some(date!(1965 - 12 - 01)),
                    series: Some(Reference { id: 3088, name: Some("Captain Atom".to_string()) }),
                    credits: vec![CreditFragment {
                        person: Reference { id: 2540, name: Some("Steve Ditko".to_string()) },
                        roles: vec!["penciler, inker".to_string()],
                    }],
                    ..Default::default()
                }),
            )
            .with_fragment(
                Kind::Issue,
                Fragment::Issue(IssueFragment {
                    id: 8193,
                    number: Some("79".to_string()),
                    series: Some(Reference { id: 3088, name: Some("Captain Atom".to_string()) }),
                    ..Default::default()
                }),
            )
            .with_fragment(
                Kind::Series,
                Fragment::Series(SeriesFragment {
                    id: 3088,
                    name: Some("Captain Atom".to_string()),
                    start_year: Some(1965),
                    publisher: Some(Reference { id: 125, name: Some("Charlton".to_string()) }),
                    ..Default::default()
                }),
            )
            .with_fragment(
                Kind::Publisher,
                Fragment::Entity(EntityFragment { id: 125, name: Some("Charlton".to_string()), description: None }),
            )
    }

    #[tokio::test]
    async fn test_import_creates_records_and_cover() {
        let f = fixture(
            vec![("DC Comics/Batman 713.cbz", build_comic(&["p2.png", "p1.png", "p3.png"], Some(BATMAN)))],
            MockCatalog::default(),
        )
        .await;
        let summary = f.library.run_full_import().await.unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.total(), 1);

        let issue = f.library.store().find_issue_by_path("DC Comics/Batman 713.cbz").await.unwrap().unwrap();
        assert_eq!(issue.number.as_deref(), Some("713"));
        assert_eq!(issue.cover_date, Some(date!(2011 - 10 - 01)));
        assert_eq!(issue.page_count, 3);
        assert_eq!(issue.status, ReadingStatus::Unread);
        assert_eq!(issue.cover.as_deref(), Some("covers/DC Comics/Batman 713.png"));
        let cover = f.media.read(Path::new("covers/DC Comics/Batman 713.png")).await.unwrap();
        assert_eq!(cover, fake_page("p1.png"));

        let series = f.library.store().get_series(issue.series_id).await.unwrap().unwrap();
        assert_eq!(series.name, "Batman");
        let publisher_id = series.publisher_id.unwrap();
        let publisher = f.library.store().get_entity(EntityKind::Publisher, publisher_id).await.unwrap().unwrap();
        assert_eq!(publisher.name, "DC Comics");

        let credits = f.library.store().issue_credits(issue.id).await.unwrap();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].creator.name, "Tony Daniel");
        assert_eq!(credits[0].roles.len(), 2);
        let arcs = f.library.store().issue_arcs(issue.id).await.unwrap();
        assert_eq!(arcs.iter().map(|arc| arc.name.as_str()).collect::<Vec<_>>(), ["Night of the Owls"]);

        let counts = f.library.store().counts().await.unwrap();
        assert_eq!((counts.publishers, counts.series, counts.issues), (1, 1, 1));
        assert_eq!((counts.creators, counts.arcs), (1, 1));
    }

    #[tokio::test]
    async fn test_reimport_is_idempotent_and_keeps_reading_state() {
        let files = vec![("Batman 713.cbz", build_comic(&["p1.png", "p2.png"], Some(BATMAN)))];
        let f = fixture(files, MockCatalog::default()).await;
        f.library.run_full_import().await.unwrap();
        let issue = f.library.store().find_issue_by_path("Batman 713.cbz").await.unwrap().unwrap();
        f.library.store().update_reading_state(issue.id, ReadingStatus::InProgress, 1).await.unwrap();
        let counts = f.library.store().counts().await.unwrap();

        let summary = f.library.run_full_import().await.unwrap();
        assert_eq!(summary, ImportSummary { unchanged: 1, ..Default::default() });
        assert_eq!(f.library.store().counts().await.unwrap(), counts);

        // A changed file is read again; the reader's place in it is not lost.
        let changed = build_comic(&["p1.png", "p2.png", "p3.png"], Some(BATMAN));
        f.comics.touch("Batman 713.cbz", changed, utc_datetime!(2030 - 01 - 01 0:00)).await;
        let summary = f.library.run_full_import().await.unwrap();
        assert_eq!(summary.updated, 1);
        let updated = f.library.store().get_issue(issue.id).await.unwrap().unwrap();
        assert_eq!(updated.page_count, 3);
        assert_eq!(updated.status, ReadingStatus::InProgress);
        assert_eq!(updated.leaf, 1);
        assert_eq!(updated.cover, issue.cover);
        assert_eq!(f.media.list(None).await.unwrap().len(), 1);
        assert_eq!(f.library.store().counts().await.unwrap(), counts);
    }

    #[tokio::test]
    async fn test_bad_archives_are_skipped_in_isolation() {
        let valid = build_comic(&["p1.png", "p2.png"], None);
        let truncated = valid[..valid.len() / 2].to_vec();
        let f = fixture(
            vec![
                ("Captain Atom 078.cbz", valid.clone()),
                ("Captain Atom 079.cbz", truncated),
                ("Captain Atom 080.cbz", valid),
                ("Captain Atom 081.cbz", b"not a zip at all".to_vec()),
                ("Captain Atom 082.cbz", build_zip([("readme.txt", b"hi".as_slice())])),
                ("cover.jpg", fake_page("cover.jpg")),
            ],
            MockCatalog::default(),
        )
        .await;
        let summary = f.library.run_full_import().await.unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.skipped, 3);
        assert_eq!(summary.total(), 5);
        assert_eq!(
            summary.skips,
            vec![
                (PathBuf::from("Captain Atom 079.cbz"), SkipReason::Corrupt),
                (PathBuf::from("Captain Atom 081.cbz"), SkipReason::NotAnArchive),
                (PathBuf::from("Captain Atom 082.cbz"), SkipReason::NoPages),
            ]
        );

        // Without embedded metadata, the filename names the issue.
        let issue = f.library.store().find_issue_by_path("Captain Atom 078.cbz").await.unwrap().unwrap();
        assert_eq!(issue.number.as_deref(), Some("78"));
        let series = f.library.store().get_series(issue.series_id).await.unwrap().unwrap();
        assert_eq!(series.name, "Captain Atom");
        assert_eq!(f.library.store().counts().await.unwrap().series, 1);
    }

    #[tokio::test]
    async fn test_event_order() {
        let f = fixture(vec![("Batman 713.cbz", build_comic(&["p1.png"], None))], MockCatalog::default()).await;
        let events: Vec<ImportEvent> = f.library.import().map(|event| event.unwrap()).collect().await;
        assert!(matches!(events[0], ImportEvent::Started));
        assert!(matches!(events[1], ImportEvent::DiscoveryComplete(1)));
        assert!(matches!(&events[2], ImportEvent::Processed { outcome: Outcome::Created(_), .. }));
        assert!(matches!(events[3], ImportEvent::Complete));
        assert_eq!(events.len(), 4);
    }

    #[tokio::test]
    async fn test_remote_metadata_wins() {
        let f = fixture(
            vec![("Captain Atom 078.cbz", build_comic(&["p1.png", "p2.png"], Some(&captain_atom(78, 8192))))],
            charlton(),
        )
        .await;
        let summary = f.library.run_full_import().await.unwrap();
        assert_eq!(summary.created, 1);

        let issue = f.library.store().find_issue_by_cvid(8192).await.unwrap().unwrap();
        assert_eq!(issue.name.as_deref(), Some("The Ghost"));
        assert_eq!(issue.number.as_deref(), Some("78"));
        assert_eq!(issue.cover_date, Some(date!(1965 - 12 - 01)));
        assert_eq!(issue.display_name("Captain Atom"), "Captain Atom #078");

        let series = f.library.store().get_series(issue.series_id).await.unwrap().unwrap();
        assert_eq!(series.cvid, Some(3088));
        assert_eq!(series.name, "Captain Atom");
        assert_eq!(series.year, Some(1965));
        let publisher = f.library.store().find_entity_by_cvid(EntityKind::Publisher, 125).await.unwrap().unwrap();
        assert_eq!(publisher.name, "Charlton");
        assert_eq!(series.publisher_id, Some(publisher.id));

        let credits = f.library.store().issue_credits(issue.id).await.unwrap();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].creator.cvid, Some(2540));
        assert_eq!(credits[0].roles, ["inker", "penciller"]);
    }

    #[tokio::test]
    async fn test_stored_parents_are_not_fetched_again() {
        let f = fixture(
            vec![
                ("Captain Atom 078.cbz", build_comic(&["p1.png"], Some(&captain_atom(78, 8192)))),
                ("Captain Atom 079.cbz", build_comic(&["p1.png"], Some(&captain_atom(79, 8193)))),
            ],
            charlton(),
        )
        .await;
        let summary = f.library.run_full_import().await.unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(
            f.catalog.lookups().await,
            vec![(Kind::Issue, 8192), (Kind::Series, 3088), (Kind::Publisher, 125), (Kind::Issue, 8193)]
        );
        let counts = f.library.store().counts().await.unwrap();
        assert_eq!((counts.publishers, counts.series, counts.issues), (1, 1, 2));
    }

    #[tokio::test]
    async fn test_unavailable_catalog_fails_without_writing() {
        let catalog = charlton().with_failure(Kind::Issue, 8192, CatalogErrorKind::RateLimited);
        let f = fixture(
            vec![("Captain Atom 078.cbz", build_comic(&["p1.png"], Some(&captain_atom(78, 8192))))],
            catalog,
        )
        .await;
        let summary = f.library.run_full_import().await.unwrap();
        assert_eq!(
            summary.failures,
            vec![Failure {
                path: "Captain Atom 078.cbz".into(),
                reason: "catalog unavailable".to_string(),
                retryable: true,
            }]
        );
        assert_eq!(f.library.store().counts().await.unwrap(), Counts::default());
        assert!(f.media.list(None).await.unwrap().is_empty());

        f.catalog.recover(Kind::Issue, 8192).await;
        let summary = f.library.run_full_import().await.unwrap();
        assert_eq!(summary, ImportSummary { created: 1, ..Default::default() });
    }

    #[tokio::test]
    async fn test_moved_archive_keeps_its_issue() {
        let bytes = build_comic(&["p1.png"], Some(&captain_atom(78, 8192)));
        let f = fixture(vec![("Unsorted/Captain Atom 078.cbz", bytes.clone())], charlton()).await;
        f.library.run_full_import().await.unwrap();
        let issue = f.library.store().find_issue_by_cvid(8192).await.unwrap().unwrap();
        f.library.store().update_reading_state(issue.id, ReadingStatus::Read, 0).await.unwrap();

        f.comics.delete(Path::new("Unsorted/Captain Atom 078.cbz")).await.unwrap();
        f.comics.write(Path::new("Charlton/Captain Atom 078.cbz"), &bytes).await.unwrap();
        let summary = f.library.run_full_import().await.unwrap();
        assert_eq!(summary.updated, 1);

        let moved = f.library.store().get_issue(issue.id).await.unwrap().unwrap();
        assert_eq!(moved.path, Path::new("Charlton/Captain Atom 078.cbz"));
        assert_eq!(moved.status, ReadingStatus::Read);
        assert_eq!(f.library.store().counts().await.unwrap().issues, 1);
    }

    #[tokio::test]
    async fn test_duplicate_external_id_is_a_conflict() {
        let bytes = build_comic(&["p1.png"], Some(&captain_atom(78, 8192)));
        let f = fixture(
            vec![("a/Captain Atom 078.cbz", bytes.clone()), ("b/Captain Atom 078.cbz", bytes)],
            charlton(),
        )
        .await;
        let summary = f.library.run_full_import().await.unwrap();
        assert_eq!(summary.created, 1);
        assert_eq!(summary.failed, 1);
        let failure = &summary.failures[0];
        assert_eq!(failure.path, Path::new("b/Captain Atom 078.cbz"));
        assert!(failure.reason.starts_with("conflict: "));
        assert!(!failure.retryable);

        let issue = f.library.store().find_issue_by_cvid(8192).await.unwrap().unwrap();
        assert_eq!(issue.path, Path::new("a/Captain Atom 078.cbz"));
    }
}
