//! Page listings for a single archive.

use longbox_archive::ComicArchive;
use std::fmt::{Display, Formatter, Result as FmtResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEntry {
    pub index: usize,
    pub name: String,
    /// Size in bytes, when known from `ComicInfo.xml` or measured.
    pub size: Option<u64>,
    /// Width and height in pixels.
    pub dimensions: Option<(u32, u32)>,
}

/// The pages of an archive in reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageReport {
    pub pages: Vec<PageEntry>,
    /// Index of a trailing scanner calibration page, if there seems to be one.
    pub scanner_artifact: Option<usize>,
}

impl PageReport {
    /// With `calculate_sizes`, every page without a recorded size or
    /// dimensions is read to measure it.
    pub fn from_archive(archive: &mut ComicArchive, calculate_sizes: bool) -> Self {
        let mut metadata = archive.read_metadata().clone();
        archive.apply_archive_info(&mut metadata, calculate_sizes);
        let pages = archive
            .page_names()
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let info = metadata.pages.iter().find(|page| page.index == index);
                PageEntry {
                    index,
                    name: name.clone(),
                    size: info.and_then(|page| page.size),
                    dimensions: info.and_then(|page| page.width.zip(page.height)),
                }
            })
            .collect();
        Self { pages, scanner_artifact: archive.scanner_page_index() }
    }
}

impl Display for PageReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for page in &self.pages {
            write!(f, "{:>4}  {}", page.index, page.name)?;
            if let Some(size) = page.size {
                write!(f, "  ({size} bytes)")?;
            }
            if let Some((width, height)) = page.dimensions {
                write!(f, "  {width}x{height}")?;
            }
            if self.scanner_artifact == Some(page.index) {
                f.write_str("  [scanner page]")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use longbox_archive::mock::{build_comic, build_zip, fake_page, png_page};

    #[test]
    fn test_report_lists_pages_in_reading_order() {
        let bytes = build_comic(&["p03.png", "p10.png", "p02.png", "p01.png", "p04.png", "zz_scan.png"], None);
        let mut archive = ComicArchive::from_bytes("Batman 713.cbz", bytes).unwrap();
        let report = PageReport::from_archive(&mut archive, false);
        let names: Vec<&str> = report.pages.iter().map(|page| page.name.as_str()).collect();
        assert_eq!(names, ["p01.png", "p02.png", "p03.png", "p04.png", "p10.png", "zz_scan.png"]);
        assert!(report.pages.iter().all(|page| page.size.is_none()));
        assert_eq!(report.scanner_artifact, Some(5));
        assert!(report.to_string().lines().last().unwrap().ends_with("zz_scan.png  [scanner page]"));
    }

    #[test]
    fn test_report_measures_pages() {
        let bytes = build_comic(&["p1.png", "p2.png"], None);
        let mut archive = ComicArchive::from_bytes("Batman 713.cbz", bytes).unwrap();
        let report = PageReport::from_archive(&mut archive, true);
        assert_eq!(report.pages[1].size, Some(fake_page("p2.png").len() as u64));
        assert_eq!(report.scanner_artifact, None);
        assert_eq!(report.pages[1].dimensions, None);
    }

    #[test]
    fn test_report_shows_page_dimensions() {
        let page = png_page(1988, 3056);
        let mut archive = ComicArchive::from_bytes("Saga 001.cbz", build_zip([("01.png", page.as_slice())])).unwrap();
        let report = PageReport::from_archive(&mut archive, true);
        assert_eq!(report.pages[0].dimensions, Some((1988, 3056)));
        assert_eq!(report.to_string(), format!("   0  01.png  ({} bytes)  1988x3056\n", page.len()));
    }
}
