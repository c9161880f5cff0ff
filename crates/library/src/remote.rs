//! Catalog lookups, and catalog records as metadata.

use crate::Library;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use longbox_catalog::{EntityFragment, Fragment, IssueFragment, Kind, SeriesFragment};
use longbox_extract::models::{Credit, Metadata, Role};

/// The catalog's view of an issue, in the shape every other source has.
///
/// Catalog role lists are free-form: each entry may hold several
/// comma-separated roles, and a person without any is credited as
/// [`Role::Other`]. References without a name are dropped.
pub fn issue_metadata(issue: &IssueFragment) -> Metadata {
    let mut credits = Vec::new();
    for credit in &issue.credits {
        let Some(person) = credit.person.name.as_deref().map(str::trim).filter(|name| !name.is_empty()) else {
            continue;
        };
        let mut roles: Vec<Role> = credit
            .roles
            .iter()
            .flat_map(|roles| roles.split(','))
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map(Role::parse_lenient)
            .collect();
        roles.sort();
        roles.dedup();
        if roles.is_empty() {
            roles.push(Role::Other);
        }
        credits.extend(roles.into_iter().map(|role| Credit::new(person, role)));
    }
    Metadata {
        series: issue.series.as_ref().and_then(|series| series.name.clone()),
        issue: issue.number.clone(),
        year: issue.cover_date.map(|date| date.year()),
        month: issue.cover_date.map(|date| u8::from(date.month())),
        day: issue.cover_date.map(|date| date.day()),
        title: issue.name.clone(),
        description: issue.description.clone(),
        credits,
        story_arcs: issue.arcs.iter().filter_map(|arc| arc.name.clone()).collect(),
        ..Default::default()
    }
}

impl Library {
    /// Look up one catalog record.
    ///
    /// Failures the catalog reports as retryable become
    /// [`RemoteUnavailable`](ErrorKind::RemoteUnavailable); anything else,
    /// including a record of the wrong shape, is [`Catalog`](ErrorKind::Catalog).
    async fn lookup(&self, kind: Kind, id: u64) -> Result<Option<Fragment>> {
        let result = self.catalog.lookup(kind, id).await;
        let retryable = result.as_ref().is_err_and(|err| err.is_retryable());
        let fragment = result.or_raise(|| match retryable {
            true => ErrorKind::RemoteUnavailable,
            false => ErrorKind::Catalog,
        })?;
        if fragment.as_ref().is_some_and(|fragment| !fragment.matches(kind)) {
            exn::bail!(ErrorKind::Catalog);
        }
        tracing::debug!(catalog = self.catalog.name(), %kind, id, found = fragment.is_some(), "Catalog lookup");
        Ok(fragment)
    }

    pub(crate) async fn lookup_issue(&self, id: u64) -> Result<Option<IssueFragment>> {
        Ok(self.lookup(Kind::Issue, id).await?.and_then(Fragment::into_issue))
    }

    pub(crate) async fn lookup_series(&self, id: u64) -> Result<Option<SeriesFragment>> {
        Ok(self.lookup(Kind::Series, id).await?.and_then(Fragment::into_series))
    }

    /// `kind` must be a publisher, creator or arc.
    pub(crate) async fn lookup_entity(&self, kind: Kind, id: u64) -> Result<Option<EntityFragment>> {
        Ok(self.lookup(kind, id).await?.and_then(Fragment::into_entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::fixture;
    use longbox_catalog::provider::MockCatalog;
    use longbox_catalog::{CreditFragment, Reference};
    use time::macros::date;

    fn reference(id: u64, name: Option<&str>) -> Reference {
        Reference { id, name: name.map(String::from) }
    }

    #[test]
    fn test_issue_metadata() {
        let issue = IssueFragment {
            id: 8192,
            name: Some("The Strange Case of the Bride of Atom".to_string()),
            number: Some("78".to_string()),
            cover_date: Some(date!(1965-12-01)),
            series: Some(reference(3088, Some("Captain Atom"))),
            credits: vec![
                CreditFragment {
                    person: reference(1, Some("Steve Ditko")),
                    roles: vec!["penciler, inker".to_string(), "cover".to_string()],
                },
                CreditFragment { person: reference(2, Some("Joe Gill")), roles: vec!["writer".to_string()] },
                CreditFragment { person: reference(3, Some("Jon D'Agostino")), roles: vec![] },
                CreditFragment { person: reference(4, None), roles: vec!["letterer".to_string()] },
            ],
            arcs: vec![reference(55, Some("Bride of Atom")), reference(56, None)],
            ..Default::default()
        };
        let md = issue_metadata(&issue);
        assert_eq!(md.series.as_deref(), Some("Captain Atom"));
        assert_eq!(md.issue.as_deref(), Some("78"));
        assert_eq!((md.year, md.month, md.day), (Some(1965), Some(12), Some(1)));
        assert_eq!(md.cover_date(), Some(date!(1965-12-01)));
        assert_eq!(
            md.credits,
            vec![
                Credit::new("Steve Ditko", Role::Penciller),
                Credit::new("Steve Ditko", Role::Inker),
                Credit::new("Steve Ditko", Role::CoverArtist),
                Credit::new("Joe Gill", Role::Writer),
                Credit::new("Jon D'Agostino", Role::Other),
            ]
        );
        assert_eq!(md.story_arcs, ["Bride of Atom"]);
        assert_eq!(md.page_count, 0);
    }

    #[tokio::test]
    async fn test_lookup_errors() {
        use longbox_catalog::error::ErrorKind as CatalogErrorKind;
        let catalog = MockCatalog::default()
            .with_failure(Kind::Issue, 1, CatalogErrorKind::RateLimited)
            .with_failure(Kind::Issue, 2, CatalogErrorKind::InvalidData("truncated".to_string()))
            .with_fragment(Kind::Series, Fragment::Series(SeriesFragment { id: 3, ..Default::default() }));
        let fixture = fixture(vec![], catalog).await;
        let library = &fixture.library;

        let err = library.lookup_issue(1).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::RemoteUnavailable));
        assert!(err.is_retryable());
        let err = library.lookup_issue(2).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Catalog));
        assert_eq!(library.lookup_issue(3).await.unwrap(), None);
        assert_eq!(library.lookup_series(3).await.unwrap().map(|series| series.id), Some(3));
    }
}
