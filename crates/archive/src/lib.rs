//! Zip comic archive reading.
//!
//! A [`ComicArchive`] wraps the raw bytes of one archive file and exposes:
//!
//! - **Entries**: raw member names and member bytes, no comic semantics.
//! - **Pages**: image members in natural reading order, with detection of a
//!   trailing scanner artifact ([`ComicArchive::scanner_page_index`]).
//! - **Metadata**: the embedded `ComicInfo.xml` (reconciled against the real
//!   page count) and filename-derived metadata.
//!
//! Anything that isn't a zip container opens as
//! [`Container::Unsupported`]: no entries, no pages, and `is_archive()` is
//! false. Callers must check before assuming there is page content.

pub mod error;
mod kind;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod natural;
mod pages;

pub use crate::kind::{ArchiveKind, MAGIC_BYTES_LEN};
pub use crate::natural::natural_cmp;
pub use crate::pages::{detect_scanner_artifact, is_page, page_list};

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use longbox_extract::models::{Metadata, PageInfo};
use longbox_extract::{COMICINFO_FILENAME, comicinfo, filename};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;
use zip::ZipArchive;
use zip::result::ZipError;

/// The container behind a [`ComicArchive`].
pub enum Container {
    Zip(ZipArchive<Cursor<Vec<u8>>>),
    /// Not a zip file. Has no entries and every read fails with
    /// [`NotAnArchive`](ErrorKind::NotAnArchive).
    Unsupported,
}
impl Container {
    pub fn kind(&self) -> ArchiveKind {
        match self {
            Container::Zip(_) => ArchiveKind::Zip,
            Container::Unsupported => ArchiveKind::Unsupported,
        }
    }
}

/// Values derived from the archive contents, computed on first use.
///
/// Reset whenever the archive's path changes (see [`ComicArchive::rename`]),
/// since the filename feeds into the metadata.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ArchiveCache {
    pub pages: Option<Vec<String>>,
    pub page_count: Option<usize>,
    pub metadata: Option<Metadata>,
}

pub struct ComicArchive {
    path: PathBuf,
    container: Container,
    cache: ArchiveCache,
    fallback_page: Option<Arc<[u8]>>,
}

impl Debug for ComicArchive {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ComicArchive")
            .field("path", &self.path)
            .field("kind", &self.container.kind())
            .field("cache", &self.cache)
            .field("fallback_page", &self.fallback_page.as_ref().map(|page| page.len()))
            .finish()
    }
}

impl ComicArchive {
    /// Open an archive file from the local filesystem.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).or_raise(|| ErrorKind::Io(path.to_path_buf()))?;
        Self::from_bytes(path, bytes)
    }

    /// Wrap the complete contents of an archive file.
    ///
    /// Bytes without a zip signature produce an unsupported archive. Bytes
    /// with a zip signature but no readable central directory are
    /// [`CorruptArchive`](ErrorKind::CorruptArchive).
    #[instrument(skip(path, bytes), fields(path = %path.as_ref().display(), size = bytes.len()))]
    pub fn from_bytes(path: impl AsRef<Path>, bytes: Vec<u8>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let container = match ArchiveKind::from_magic_bytes(&bytes) {
            ArchiveKind::Zip => Container::Zip(
                ZipArchive::new(Cursor::new(bytes)).or_raise(|| ErrorKind::CorruptArchive(path.clone()))?,
            ),
            ArchiveKind::Unsupported => {
                tracing::debug!("No zip signature; treating as unsupported container");
                Container::Unsupported
            },
        };
        Ok(Self { path, container, cache: ArchiveCache::default(), fallback_page: None })
    }

    /// Image returned by [`page`](Self::page) when the real page can't be
    /// read, instead of an error.
    pub fn with_fallback_page(mut self, image: impl Into<Arc<[u8]>>) -> Self {
        self.fallback_page = Some(image.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn cache(&self) -> &ArchiveCache {
        &self.cache
    }

    /// Point the archive at a new path (after the file was moved), dropping
    /// everything derived from the old one.
    pub fn rename(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if path != self.path {
            self.path = path;
            self.cache = ArchiveCache::default();
        }
    }

    /// `true` when the container is a readable zip.
    pub fn is_archive(&self) -> bool {
        matches!(self.container, Container::Zip(_))
    }

    /// `true` for a zip container with at least one page.
    pub fn is_comic_archive(&mut self) -> bool {
        self.is_archive() && self.page_count() > 0
    }

    // =========================================================================
    // Entries
    // =========================================================================

    /// Raw member names, in central directory order. Empty when unsupported.
    pub fn entries(&self) -> Vec<String> {
        match &self.container {
            Container::Zip(zip) => zip.file_names().map(String::from).collect(),
            Container::Unsupported => Vec::new(),
        }
    }

    /// Read the complete contents of a member.
    pub fn read_entry(&mut self, name: &str) -> Result<Vec<u8>> {
        let Container::Zip(zip) = &mut self.container else {
            exn::bail!(ErrorKind::NotAnArchive(self.path.clone()));
        };
        let path = &self.path;
        let result = zip.by_name(name);
        if matches!(result, Err(ZipError::FileNotFound)) {
            exn::bail!(ErrorKind::EntryNotFound(name.to_string()));
        }
        let mut file = result.or_raise(|| ErrorKind::CorruptArchive(path.clone()))?;
        let mut data = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut data).or_raise(|| ErrorKind::CorruptArchive(path.clone()))?;
        Ok(data)
    }

    // =========================================================================
    // Pages
    // =========================================================================

    /// Page members in natural, case-insensitive order.
    pub fn page_names(&mut self) -> &[String] {
        let container = &self.container;
        self.cache.pages.get_or_insert_with(|| match container {
            Container::Zip(zip) => page_list(zip.file_names()),
            Container::Unsupported => Vec::new(),
        })
    }

    pub fn page_count(&mut self) -> usize {
        if let Some(count) = self.cache.page_count {
            return count;
        }
        let count = self.page_names().len();
        self.cache.page_count = Some(count);
        count
    }

    pub fn page_name(&mut self, index: usize) -> Option<String> {
        self.page_names().get(index).cloned()
    }

    /// Raw bytes of the page at `index`.
    ///
    /// When a fallback image is configured it is returned (with a warning)
    /// for an out-of-range index or an unreadable page; otherwise those
    /// surface as [`EntryNotFound`](ErrorKind::EntryNotFound) and
    /// [`CorruptArchive`](ErrorKind::CorruptArchive).
    pub fn page(&mut self, index: usize) -> Result<Vec<u8>> {
        let result = match self.page_name(index) {
            Some(name) => self.read_entry(&name),
            None => Err(exn::Exn::from(ErrorKind::EntryNotFound(format!("page {index}")))),
        };
        match (result, &self.fallback_page) {
            (Ok(data), _) => Ok(data),
            (Err(err), Some(fallback)) => {
                tracing::warn!(path = %self.path.display(), index, error = %*err, "Using fallback image for unreadable page");
                Ok(fallback.to_vec())
            },
            (Err(err), None) => Err(err),
        }
    }

    /// Index of a trailing scanner calibration page, if the page names
    /// suggest one. See [`detect_scanner_artifact`].
    pub fn scanner_page_index(&mut self) -> Option<usize> {
        detect_scanner_artifact(self.page_names())
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    fn comicinfo_name(&self) -> Option<String> {
        match &self.container {
            Container::Zip(zip) => zip.file_names().find(|n| n.eq_ignore_ascii_case(COMICINFO_FILENAME)).map(String::from),
            Container::Unsupported => None,
        }
    }

    /// `true` when the archive carries an embedded `ComicInfo.xml`.
    pub fn has_comicinfo(&mut self) -> bool {
        self.is_comic_archive() && self.comicinfo_name().is_some()
    }

    /// Embedded metadata, reconciled against the archive's real page count.
    ///
    /// A missing, unreadable or unparsable `ComicInfo.xml` yields empty
    /// metadata (with the page count and a default page list filled in).
    pub fn read_metadata(&mut self) -> &Metadata {
        if self.cache.metadata.is_none() {
            let mut metadata = self.read_comicinfo();
            metadata.reconcile_page_count(self.page_count());
            self.cache.metadata = Some(metadata);
        }
        self.cache.metadata.get_or_insert_with(Metadata::default)
    }

    fn read_comicinfo(&mut self) -> Metadata {
        if !self.is_comic_archive() {
            return Metadata::default();
        }
        let Some(name) = self.comicinfo_name() else {
            return Metadata::default();
        };
        let bytes = match self.read_entry(&name) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %*err, "Unreadable ComicInfo.xml; ignoring");
                return Metadata::default();
            },
        };
        match comicinfo::parse(&String::from_utf8_lossy(&bytes)) {
            Ok(metadata) => metadata,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %*err, "Invalid ComicInfo.xml; ignoring");
                Metadata::default()
            },
        }
    }

    /// Metadata inferred from the archive's filename, with the page count
    /// taken from the archive.
    pub fn metadata_from_filename(&mut self, retain_scan_info: bool) -> Metadata {
        let mut metadata = filename::parse(&self.path, retain_scan_info);
        metadata.page_count = self.page_count();
        metadata
    }

    /// Fill in what only the archive knows: the page count, and optionally
    /// each page's size in bytes and pixel dimensions (for pages missing
    /// either).
    pub fn apply_archive_info(&mut self, metadata: &mut Metadata, calculate_page_sizes: bool) {
        metadata.reconcile_page_count(self.page_count());
        if !calculate_page_sizes {
            return;
        }
        let incomplete = |page: &PageInfo| page.size.is_none() || page.width.is_none() || page.height.is_none();
        for page in metadata.pages.iter_mut().filter(|page| incomplete(page)) {
            let Some(name) = self.page_name(page.index) else {
                continue;
            };
            let data = match self.read_entry(&name) {
                Ok(data) => data,
                Err(err) => {
                    tracing::debug!(page = %name, error = %*err, "Unable to size page");
                    continue;
                },
            };
            page.size = page.size.or_else(|| u64::try_from(data.len()).ok());
            if page.width.is_some() && page.height.is_some() {
                continue;
            }
            // Only the image header is parsed, not the pixels.
            match imagesize::blob_size(&data) {
                Ok(dimensions) => {
                    page.width = page.width.or_else(|| u32::try_from(dimensions.width).ok());
                    page.height = page.height.or_else(|| u32::try_from(dimensions.height).ok());
                },
                Err(err) => tracing::debug!(page = %name, error = %err, "Unable to measure page"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{FAKE_PNG, build_comic, build_zip, fake_page, png_page};

    const SIX_PAGES: [&str; 6] = ["page2.jpg", "page10.jpg", "page1.jpg", "page3.jpg", "page4.jpg", "page5.jpg"];

    fn comicinfo_with_pages(count: usize) -> String {
        let pages: String = (0..count).map(|i| format!(r#"<Page Image="{i}" ImageSize="99" />"#)).collect();
        format!("<ComicInfo><Series>Batman</Series><Year>1940</Year><Pages>{pages}</Pages></ComicInfo>")
    }

    #[test]
    fn test_pages_in_natural_order() {
        let mut archive = ComicArchive::from_bytes("Batman 1.cbz", build_comic(&SIX_PAGES, None)).unwrap();
        assert!(archive.is_archive());
        assert!(archive.is_comic_archive());
        assert_eq!(archive.page_count(), 6);
        assert_eq!(
            archive.page_names(),
            ["page1.jpg", "page2.jpg", "page3.jpg", "page4.jpg", "page5.jpg", "page10.jpg"]
        );
        assert_eq!(archive.page(5).unwrap(), fake_page("page10.jpg"));
    }

    #[test]
    fn test_entries_are_raw() {
        let archive = ComicArchive::from_bytes("a.cbz", build_comic(&["b.jpg", "a.jpg"], Some("<ComicInfo/>"))).unwrap();
        assert_eq!(archive.entries(), ["b.jpg", "a.jpg", "ComicInfo.xml"]);
    }

    #[test]
    fn test_unsupported_container() {
        let mut archive = ComicArchive::from_bytes("Batman 1.cbr", b"Rar!\x1a\x07\x00 not a zip".to_vec()).unwrap();
        assert!(!archive.is_archive());
        assert!(!archive.is_comic_archive());
        assert_eq!(archive.container().kind(), ArchiveKind::Unsupported);
        assert!(archive.entries().is_empty());
        assert_eq!(archive.page_count(), 0);
        let err = archive.read_entry("page1.jpg").unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotAnArchive(_)));
    }

    #[test]
    fn test_corrupt_container() {
        let mut bytes = build_comic(&SIX_PAGES, None);
        // Keep the signature, lose the central directory.
        bytes.truncate(bytes.len() / 2);
        let err = ComicArchive::from_bytes("Batman 1.cbz", bytes).unwrap_err();
        assert!(matches!(&*err, ErrorKind::CorruptArchive(_)));
    }

    #[test]
    fn test_zip_without_pages_is_not_a_comic() {
        let mut archive = ComicArchive::from_bytes("notes.zip", build_zip([("notes.txt", b"hi".as_slice())])).unwrap();
        assert!(archive.is_archive());
        assert!(!archive.is_comic_archive());
        assert!(!archive.has_comicinfo());
    }

    #[test]
    fn test_read_entry_not_found() {
        let mut archive = ComicArchive::from_bytes("a.cbz", build_comic(&["a.jpg"], None)).unwrap();
        let err = archive.read_entry("missing.jpg").unwrap_err();
        assert!(matches!(&*err, ErrorKind::EntryNotFound(_)));
    }

    #[test]
    fn test_page_out_of_range_without_fallback() {
        let mut archive = ComicArchive::from_bytes("a.cbz", build_comic(&["a.jpg"], None)).unwrap();
        let err = archive.page(1).unwrap_err();
        assert!(matches!(&*err, ErrorKind::EntryNotFound(_)));
    }

    #[test]
    fn test_page_out_of_range_uses_fallback() {
        let mut archive =
            ComicArchive::from_bytes("a.cbz", build_comic(&["a.jpg"], None)).unwrap().with_fallback_page(b"logo".to_vec());
        assert_eq!(archive.page(7).unwrap(), b"logo");
        assert_eq!(archive.page(0).unwrap(), fake_page("a.jpg"));
    }

    #[test]
    fn test_scanner_page_index() {
        let pages = ["001.jpg", "002.jpg", "003.jpg", "004.jpg", "005.jpg", "scan.jpg"];
        let mut archive = ComicArchive::from_bytes("a.cbz", build_comic(&pages, None)).unwrap();
        assert_eq!(archive.scanner_page_index(), Some(5));
        let pages = ["image01.jpg", "image02.jpg", "image03.jpg", "image04.jpg", "image05.jpg", "image06.jpg"];
        let mut archive = ComicArchive::from_bytes("a.cbz", build_comic(&pages, None)).unwrap();
        assert_eq!(archive.scanner_page_index(), None);
    }

    #[test]
    fn test_metadata_with_matching_page_list() {
        let xml = comicinfo_with_pages(6);
        let mut archive = ComicArchive::from_bytes("a.cbz", build_comic(&SIX_PAGES, Some(&xml))).unwrap();
        assert!(archive.has_comicinfo());
        let metadata = archive.read_metadata();
        assert_eq!(metadata.series.as_deref(), Some("Batman"));
        assert_eq!(metadata.year, Some(1940));
        assert_eq!(metadata.page_count, 6);
        assert!(metadata.pages.iter().all(|page| page.size == Some(99)));
    }

    #[test]
    fn test_metadata_page_list_mismatch_is_replaced() {
        let xml = comicinfo_with_pages(5);
        let mut archive = ComicArchive::from_bytes("a.cbz", build_comic(&SIX_PAGES, Some(&xml))).unwrap();
        let metadata = archive.read_metadata();
        assert_eq!(metadata.page_count, 6);
        assert_eq!(metadata.pages.len(), 6);
        assert!(metadata.pages.iter().enumerate().all(|(i, page)| page.index == i && page.size.is_none()));
    }

    #[test]
    fn test_missing_or_broken_comicinfo_is_empty_metadata() {
        let mut archive = ComicArchive::from_bytes("a.cbz", build_comic(&SIX_PAGES, None)).unwrap();
        assert!(archive.read_metadata().series.is_none());
        assert_eq!(archive.read_metadata().page_count, 6);

        let broken = "<ComicInfo><Series>Bat</Title>";
        let mut archive = ComicArchive::from_bytes("a.cbz", build_comic(&SIX_PAGES, Some(broken))).unwrap();
        assert!(archive.read_metadata().series.is_none());
        assert_eq!(archive.read_metadata().pages.len(), 6);
    }

    #[test]
    fn test_metadata_is_cached_until_rename() {
        let mut archive = ComicArchive::from_bytes("Batman 713.cbz", build_comic(&SIX_PAGES, None)).unwrap();
        archive.read_metadata();
        assert!(archive.cache().metadata.is_some());
        assert_eq!(archive.cache().page_count, Some(6));
        archive.rename("Batman 713.cbz");
        assert!(archive.cache().metadata.is_some());
        archive.rename("Detective Comics 27.cbz");
        assert_eq!(archive.cache(), &ArchiveCache::default());
        assert_eq!(archive.metadata_from_filename(false).series.as_deref(), Some("Detective Comics"));
    }

    #[test]
    fn test_metadata_from_filename() {
        let mut archive =
            ComicArchive::from_bytes("Batman 713 (2011) (digital).cbz", build_comic(&SIX_PAGES, None)).unwrap();
        let metadata = archive.metadata_from_filename(true);
        assert_eq!(metadata.series.as_deref(), Some("Batman"));
        assert_eq!(metadata.issue.as_deref(), Some("713"));
        assert_eq!(metadata.year, Some(2011));
        assert_eq!(metadata.scan_info.as_deref(), Some("(digital)"));
        assert_eq!(metadata.page_count, 6);
    }

    #[test]
    fn test_apply_archive_info_calculates_page_sizes() {
        let mut archive = ComicArchive::from_bytes("a.cbz", build_comic(&["p1.jpg", "p2.jpg"], None)).unwrap();
        let mut metadata = Metadata::default();
        archive.apply_archive_info(&mut metadata, false);
        assert_eq!(metadata.page_count, 2);
        assert!(metadata.pages.iter().all(|page| page.size.is_none()));
        archive.apply_archive_info(&mut metadata, true);
        let expected = u64::try_from(FAKE_PNG.len() + "p1.jpg".len()).unwrap();
        assert!(metadata.pages.iter().all(|page| page.size == Some(expected)));
        // Too short to carry an image header.
        assert!(metadata.pages.iter().all(|page| page.width.is_none() && page.height.is_none()));
    }

    #[test]
    fn test_apply_archive_info_measures_pages() {
        let cover = png_page(1988, 3056);
        let spread = png_page(3976, 3056);
        let bytes = build_zip([("01.png", cover.as_slice()), ("02.png", spread.as_slice())]);
        let mut archive = ComicArchive::from_bytes("Saga 001.cbz", bytes).unwrap();
        let mut metadata = Metadata::default();
        archive.apply_archive_info(&mut metadata, true);
        let dimensions: Vec<_> = metadata.pages.iter().map(|page| (page.width, page.height)).collect();
        assert_eq!(dimensions, [(Some(1988), Some(3056)), (Some(3976), Some(3056))]);
        assert_eq!(metadata.pages[0].size, Some(u64::try_from(cover.len()).unwrap()));

        // Dimensions already on record are kept.
        metadata.pages[1].width = Some(1988);
        metadata.pages[1].height = None;
        archive.apply_archive_info(&mut metadata, true);
        assert_eq!((metadata.pages[1].width, metadata.pages[1].height), (Some(1988), Some(3056)));
    }

    #[test]
    fn test_open_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Watchmen 01 (of 12) (1986).cbz");
        std::fs::write(&path, build_comic(&["01.jpg", "02.jpg"], None)).unwrap();
        let mut archive = ComicArchive::open(&path).unwrap();
        assert_eq!(archive.page_count(), 2);
        assert_eq!(archive.metadata_from_filename(false).issue_count, Some(12));
        std::fs::remove_file(&path).unwrap();
        let err = ComicArchive::open(&path).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Io(_)));
    }
}
