//! Page classification and the scanner-artifact heuristic.

use crate::natural::natural_cmp;
use std::collections::HashMap;

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];
/// Below this many pages there isn't enough signal to call one an outlier.
const MIN_PAGES_FOR_SCANNER_CHECK: usize = 5;

/// Final path component of an archive member name (always `/`-separated).
pub(crate) fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// `true` for members with an image extension that aren't hidden files.
pub fn is_page(name: &str) -> bool {
    let base = basename(name);
    if base.starts_with('.') {
        return false;
    }
    base.rsplit_once('.')
        .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.iter().any(|img| img.eq_ignore_ascii_case(ext)))
}

/// Filter member names down to pages, in natural reading order.
pub fn page_list<'a>(entries: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut pages: Vec<String> = entries.into_iter().filter(|name| is_page(name)).map(String::from).collect();
    pages.sort_by(|a, b| natural_cmp(a, b));
    pages
}

fn common_prefix<'a>(mut names: impl Iterator<Item = &'a str>) -> String {
    let Some(first) = names.next() else {
        return String::new();
    };
    let mut prefix: Vec<char> = first.chars().collect();
    for name in names {
        let shared = prefix.iter().zip(name.chars()).take_while(|(a, b)| *a == b).count();
        prefix.truncate(shared);
    }
    prefix.into_iter().collect()
}

/// Index of a trailing page that looks like a scanner calibration target
/// rather than story content, if there is one.
///
/// Page basenames usually share a length and a prefix. The last page is
/// flagged when it breaks the shared prefix, or (for short, purely numeric
/// naming schemes without a shared prefix) when it is longer than the most
/// common name length. Only ever flags the last page; what to do about it is
/// up to the caller.
pub fn detect_scanner_artifact<S: AsRef<str>>(pages: &[S]) -> Option<usize> {
    if pages.len() < MIN_PAGES_FOR_SCANNER_CHECK {
        return None;
    }
    let names: Vec<&str> = pages.iter().map(|page| basename(page.as_ref())).collect();
    let mut lengths: HashMap<usize, usize> = HashMap::new();
    for name in &names {
        *lengths.entry(name.chars().count()).or_default() += 1;
    }
    // Most frequent length; ties go to the longer name.
    let (&mode_length, _) = lengths.iter().max_by_key(|&(length, count)| (*count, *length))?;
    let prefix = common_prefix(names.iter().copied().filter(|name| name.chars().count() == mode_length));
    let last = names.last()?;

    let flagged = match mode_length <= 7 && prefix.is_empty() {
        true => last.chars().count() > mode_length,
        false => !last.starts_with(&prefix),
    };
    flagged.then_some(pages.len() - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("p001.jpg", true)]
    #[case("p001.JPEG", true)]
    #[case("dir/p001.png", true)]
    #[case("cover.webp", true)]
    #[case("anim.gif", true)]
    #[case("ComicInfo.xml", false)]
    #[case("._p001.jpg", false)]
    #[case("__MACOSX/.p001.jpg", false)]
    #[case("scans/", false)]
    #[case("jpg", false)]
    fn test_is_page(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_page(name), expected);
    }

    #[test]
    fn test_page_list_filters_and_sorts() {
        let entries = ["page2.jpg", "ComicInfo.xml", "page10.jpg", ".DS_Store", "page1.jpg"];
        assert_eq!(page_list(entries), ["page1.jpg", "page2.jpg", "page10.jpg"]);
    }

    #[test]
    fn test_scanner_page_with_different_name() {
        let pages = ["001.jpg", "002.jpg", "003.jpg", "004.jpg", "005.jpg", "scan.jpg"];
        assert_eq!(detect_scanner_artifact(&pages), Some(5));
    }

    #[test]
    fn test_uniform_names_flag_nothing() {
        let pages = ["image01.jpg", "image02.jpg", "image03.jpg", "image04.jpg", "image05.jpg", "image06.jpg"];
        assert_eq!(detect_scanner_artifact(&pages), None);
    }

    #[test]
    fn test_too_few_pages_flag_nothing() {
        let pages = ["001.jpg", "002.jpg", "003.jpg", "zzzz-scanner.jpg"];
        assert_eq!(detect_scanner_artifact(&pages), None);
    }

    #[test]
    fn test_numeric_names_with_long_last_page() {
        // No shared prefix among the short numeric names, so length decides.
        let pages = ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg", "6.jpg", "zz_tag.jpg"];
        assert_eq!(detect_scanner_artifact(&pages), Some(6));
    }

    #[test]
    fn test_prefix_uses_basenames() {
        let pages = [
            "Batman 713/Batman 713 - 01.jpg",
            "Batman 713/Batman 713 - 02.jpg",
            "Batman 713/Batman 713 - 03.jpg",
            "Batman 713/Batman 713 - 04.jpg",
            "Batman 713/Batman 713 - 05.jpg",
        ];
        assert_eq!(detect_scanner_artifact(&pages), None);
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix(["image01", "image02", "image1"].into_iter()), "image");
        assert_eq!(common_prefix(["abc"].into_iter()), "abc");
        assert_eq!(common_prefix(std::iter::empty()), "");
    }
}
