use regex::Regex;
use std::sync::LazyLock;

/// Conventional name of the embedded metadata member inside a comic archive.
pub const COMICINFO_FILENAME: &str = "ComicInfo.xml";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Filename heuristics.
regex!(PAREN_GROUP_REGEX, r"\(.*?\)");
regex!(BRACKET_GROUP_REGEX, r"\[.*?\]");
regex!(SEPARATOR_REGEX, r"[-_]");
regex!(UNDERSCORE_REGEX, r"_");
regex!(OF_COUNT_REGEX, r"of \d+");
regex!(WORD_REGEX, r"\S+");
// At most four digits before any decimal part; longer numbers are never issues.
regex!(HASH_ISSUE_REGEX, r"^#-?(([0-9]{0,4}\.[0-9]+|[0-9]{1,4})(\.[0-9]+)?)([a-zA-Z]*)$");
regex!(BARE_ISSUE_REGEX, r"^-?(([0-9]{0,4}\.[0-9]+|[0-9]{1,4})(\.[0-9]+)?)([a-zA-Z]*)$");
regex!(HASH_ANY_REGEX, r"^#\S+");
regex!(VOLUME_REGEX, r"(.+)([vV]|[Vv][oO][Ll]\.?\s?)(\d+)\s*$");
regex!(VOLUME_YEAR_REGEX, r"(\()(\d{4})(-(\d{4}|)|)(\))");
regex!(YEAR_REGEX, r"(\(\d{4}\))|(--\d{4}--)");
regex!(COUNT_OF_REGEX, r"(?i)\sof\s(\d+)\s");
regex!(COUNT_PAREN_REGEX, r"(?i)\(of\s(\d+)\)");

// External catalog identifiers embedded in metadata notes and web links.
regex!(NOTES_ID_REGEX, r"\[(?:Issue ID|CVDB)\s*(\d+)\]");
regex!(WEB_ID_REGEX, r"/\d+-(\d+)/?$");
