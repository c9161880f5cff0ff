//! Field-by-field merge of every metadata source known for an issue.
//!
//! Sources, from most to least trusted:
//!
//! 1. the remote catalog;
//! 2. what the library already has on record;
//! 3. the archive's embedded `ComicInfo.xml`;
//! 4. the archive's filename.
//!
//! For each field the most trusted source with a value wins. Reading state
//! never passes through here, so no source can overwrite it.

use longbox_extract::models::Metadata;

fn text(sources: &[&Metadata], field: impl Fn(&Metadata) -> Option<&String>) -> Option<String> {
    sources.iter().filter_map(|&md| field(md)).find(|value| !value.trim().is_empty()).cloned()
}

fn value<T: Copy>(sources: &[&Metadata], field: impl Fn(&Metadata) -> Option<T>) -> Option<T> {
    sources.iter().find_map(|&md| field(md))
}

fn list<T: Clone>(sources: &[&Metadata], field: impl Fn(&Metadata) -> &Vec<T>) -> Vec<T> {
    sources.iter().map(|&md| field(md)).find(|items| !items.is_empty()).cloned().unwrap_or_default()
}

/// Merge every available source into the metadata to persist.
///
/// The cover date is taken as a unit from the first source with a year, so a
/// remote year is never combined with a month from the filename. Page data
/// only ever comes from the archive (embedded metadata has already been
/// reconciled against it) or, failing that, from what is on record.
pub fn reconcile(
    existing: Option<&Metadata>,
    remote: Option<&Metadata>,
    embedded: &Metadata,
    filename: &Metadata,
) -> Metadata {
    let sources: Vec<&Metadata> = [remote, existing, Some(embedded), Some(filename)].into_iter().flatten().collect();
    let date = sources.iter().find(|md| md.year.is_some());
    let (page_count, pages) = [embedded, filename]
        .into_iter()
        .chain(existing)
        .find(|md| md.page_count > 0)
        .map(|md| (md.page_count, md.pages.clone()))
        .unwrap_or_default();

    Metadata {
        series: text(&sources, |md| md.series.as_ref()),
        issue: text(&sources, |md| md.issue.as_ref()),
        volume: value(&sources, |md| md.volume),
        year: date.and_then(|md| md.year),
        month: date.and_then(|md| md.month),
        day: date.and_then(|md| md.day),
        title: text(&sources, |md| md.title.as_ref()),
        issue_count: value(&sources, |md| md.issue_count),
        description: text(&sources, |md| md.description.as_ref()),
        notes: text(&sources, |md| md.notes.as_ref()),
        web: text(&sources, |md| md.web.as_ref()),
        publisher: text(&sources, |md| md.publisher.as_ref()),
        scan_info: text(&sources, |md| md.scan_info.as_ref()),
        page_count,
        pages,
        credits: list(&sources, |md| &md.credits),
        story_arcs: list(&sources, |md| &md.story_arcs),
    }
}
