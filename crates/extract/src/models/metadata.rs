use super::{Credit, PageInfo};
use crate::consts::{NOTES_ID_REGEX, WEB_ID_REGEX};
use time::{Date, Month};

/// Source-agnostic metadata for a single issue.
///
/// Produced by the ComicInfo parser, the filename heuristics and (after
/// conversion) the remote catalog. Every field is optional except the page
/// count, which always comes from the archive itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metadata {
    pub series: Option<String>,
    /// Issue number, kept as text ("1", "0.5", "12AU", "-1")
    pub issue: Option<String>,
    pub volume: Option<u32>,
    pub year: Option<i32>,
    pub month: Option<u8>,
    pub day: Option<u8>,
    /// Issue title (story name)
    pub title: Option<String>,
    /// Number of issues in a limited series ("of 12")
    pub issue_count: Option<u32>,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub web: Option<String>,
    pub publisher: Option<String>,
    /// Leftover filename tokens (scan group, "digital", etc.)
    pub scan_info: Option<String>,
    pub page_count: usize,
    pub pages: Vec<PageInfo>,
    pub credits: Vec<Credit>,
    pub story_arcs: Vec<String>,
}

impl Metadata {
    /// `true` when no source has contributed anything.
    pub fn is_empty(&self) -> bool {
        self.series.is_none()
            && self.issue.is_none()
            && self.volume.is_none()
            && self.year.is_none()
            && self.month.is_none()
            && self.day.is_none()
            && self.title.is_none()
            && self.issue_count.is_none()
            && self.description.is_none()
            && self.notes.is_none()
            && self.web.is_none()
            && self.publisher.is_none()
            && self.scan_info.is_none()
            && self.pages.is_empty()
            && self.credits.is_empty()
            && self.story_arcs.is_empty()
    }

    /// Replace the per-page list with `count` sequential entries carrying no
    /// size or dimension data.
    pub fn set_default_page_list(&mut self, count: usize) {
        self.pages = (0..count).map(PageInfo::new).collect();
    }

    /// Align the metadata with the page count of the archive it came from.
    ///
    /// The archive's real page count always wins: a per-page list of any
    /// other length is discarded and regenerated.
    pub fn reconcile_page_count(&mut self, page_count: usize) {
        if self.pages.len() != page_count {
            if !self.pages.is_empty() {
                tracing::debug!(
                    embedded = self.pages.len(),
                    actual = page_count,
                    "Discarding embedded page list; page count does not match archive"
                );
            }
            self.set_default_page_list(page_count);
        }
        self.page_count = page_count;
    }

    /// Cover date assembled from year, month and day.
    ///
    /// Month defaults to January and day to the 1st. Returns `None` without a
    /// year or when the parts don't form a real date.
    pub fn cover_date(&self) -> Option<Date> {
        let year = self.year?;
        let month = Month::try_from(self.month.unwrap_or(1)).ok()?;
        Date::from_calendar_date(year, month, self.day.unwrap_or(1)).ok()
    }

    /// External catalog identifier recorded by tagging tools.
    ///
    /// Looks for `[Issue ID 1234]` / `[CVDB1234]` in the notes first, then a
    /// trailing `/4000-1234/` segment in the web link.
    pub fn external_id(&self) -> Option<u64> {
        let from_notes = self
            .notes
            .as_deref()
            .and_then(|notes| NOTES_ID_REGEX.captures(notes))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok());
        from_notes.or_else(|| {
            self.web
                .as_deref()
                .and_then(|web| WEB_ID_REGEX.captures(web.trim()))
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
    }
}
