//! Best-effort metadata from an archive's filename.
//!
//! Everything here operates on byte offsets into a "blanked" copy of the
//! filename: annotations that can't be the issue number (parenthetical and
//! bracketed groups, separators, "of NN") are overwritten with the same number
//! of spaces, so word positions found in the blanked copy are valid offsets
//! into the original.

use crate::consts::{
    BARE_ISSUE_REGEX, BRACKET_GROUP_REGEX, COUNT_OF_REGEX, COUNT_PAREN_REGEX, HASH_ANY_REGEX, HASH_ISSUE_REGEX,
    OF_COUNT_REGEX, PAREN_GROUP_REGEX, SEPARATOR_REGEX, UNDERSCORE_REGEX, VOLUME_REGEX, VOLUME_YEAR_REGEX, WORD_REGEX,
    YEAR_REGEX,
};
use crate::models::Metadata;
use regex::Regex;
use std::borrow::Cow;
use std::ops::RangeInclusive;
use std::path::Path;
use tracing::instrument;

const ONE_SHOT_WORDS: [&str; 5] = ["tpb", "os", "one-shot", "ogn", "gn"];
const PLAUSIBLE_YEARS: RangeInclusive<i32> = 1900..=2099;

/// Where the issue number was found in the filename.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct IssueToken {
    issue: String,
    start: usize,
    end: usize,
}

/// Infer series, volume, issue number, year and issue count from a filename.
///
/// This is the lowest-precedence metadata source: every field may come back
/// empty. Leftover tokens (scan group, "digital", ...) are only kept as
/// `scan_info` when `retain_scan_info` is set.
#[instrument(skip(path), fields(path = %path.as_ref().display()))]
pub fn parse(path: impl AsRef<Path>, retain_scan_info: bool) -> Metadata {
    let filename = normalize(path.as_ref());
    let token = issue_token(&filename);
    let (series, volume) = series_and_volume(&filename, token.start);
    let issue_end = match token.end {
        // Without an issue number, everything after the series is fair game.
        0 => series.len(),
        end => end,
    };
    let year = year(&filename, issue_end);
    let issue_count = issue_count(&filename, issue_end);

    let mut metadata = Metadata {
        series: non_empty(series),
        issue: non_empty(clean_issue(&token.issue)),
        volume: volume.parse().ok(),
        year: year.parse().ok(),
        issue_count: issue_count.parse().ok(),
        ..Default::default()
    };
    if retain_scan_info {
        metadata.scan_info = non_empty(remainder(&filename, &year, &issue_count, &volume, issue_end));
    }
    metadata
}

/// File stem, percent-decoded, with mangled `_28`/`_29` parentheses repaired.
fn normalize(path: &Path) -> String {
    let stem = path.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let mut filename = match urlencoding::decode(&stem) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => stem.to_string(),
    };
    // Archives that went through one too many encode/decode rounds end up with
    // "_28" and "_29" in place of "(" and ")".
    if filename.matches("_28").count() > 1 && filename.matches("_29").count() > 1 {
        filename = filename.replace("_28", "(").replace("_29", ")");
    }
    filename
}

/// Overwrite every match with the same number of bytes of spaces.
fn blank<'a>(regex: &Regex, text: &'a str) -> Cow<'a, str> {
    regex.replace_all(text, |caps: &regex::Captures<'_>| " ".repeat(caps[0].len()))
}

/// Blank out everything from the first `--` (or `__`) onwards. Those names
/// put the series and issue on the left and free text on the right.
fn blank_trailer(filename: &str) -> String {
    let split = filename.find("--").or_else(|| filename.find("__"));
    match split {
        Some(at) => format!("{}{}", &filename[..at], " ".repeat(filename.len() - at)),
        None => filename.to_string(),
    }
}

fn fix_spaces(text: &str, remove_dashes: bool) -> String {
    match remove_dashes {
        true => blank(&SEPARATOR_REGEX, text).into_owned(),
        false => blank(&UNDERSCORE_REGEX, text).into_owned(),
    }
}

fn issue_token(filename: &str) -> IssueToken {
    let blanked = blank_trailer(filename).replace('+', " ");
    let blanked = blank(&PAREN_GROUP_REGEX, &blanked).into_owned();
    let blanked = blank(&BRACKET_GROUP_REGEX, &blanked).into_owned();
    let blanked = fix_spaces(&blanked, true);
    let blanked = blank(&OF_COUNT_REGEX, &blanked);

    let words: Vec<_> = WORD_REGEX.find_iter(&blanked).collect();
    // The first word is never the issue number; a single word has no issue.
    let Some((_, candidates)) = words.split_first().filter(|(_, rest)| !rest.is_empty()) else {
        return IssueToken::default();
    };
    let found = candidates
        .iter()
        .rev()
        .find(|word| HASH_ISSUE_REGEX.is_match(word.as_str()))
        .or_else(|| candidates.last().filter(|word| BARE_ISSUE_REGEX.is_match(word.as_str())))
        .or_else(|| candidates.iter().rev().find(|word| HASH_ANY_REGEX.is_match(word.as_str())));
    match found {
        Some(word) => IssueToken {
            issue: word.as_str().strip_prefix('#').unwrap_or(word.as_str()).to_string(),
            start: word.start(),
            end: word.end(),
        },
        None => IssueToken::default(),
    }
}

fn series_and_volume(filename: &str, issue_start: usize) -> (String, String) {
    let head = match issue_start {
        0 => filename,
        start => filename.get(..start).unwrap_or(filename),
    };
    let head = blank_trailer(head).replace('+', " ");
    let mut series = fix_spaces(&head, false);
    let last_word = series.split_whitespace().last().unwrap_or_default().to_string();
    series = PAREN_GROUP_REGEX.replace_all(&series, "").into_owned();

    let mut volume = String::new();
    let found = VOLUME_REGEX.captures(&series).map(|caps| (caps[1].to_string(), caps[3].to_string()));
    if let Some((name, number)) = found {
        series = name;
        volume = number;
    }
    // "Batman (2011)" is a common way of naming the volume.
    if volume.is_empty()
        && let Some(caps) = VOLUME_YEAR_REGEX.captures(&last_word)
    {
        volume = caps[2].to_string();
    }

    let mut series = series.trim().to_string();
    if issue_start == 0
        && let Some((rest, last)) = series.rsplit_once(' ')
        && ONE_SHOT_WORDS.contains(&last.to_lowercase().as_str())
    {
        series = rest.trim_end().to_string();
    }
    (series, volume.trim().to_string())
}

fn year(filename: &str, issue_end: usize) -> String {
    let tail = filename.get(issue_end..).unwrap_or_default();
    YEAR_REGEX
        .find_iter(tail)
        .map(|m| m.as_str().chars().filter(char::is_ascii_digit).collect::<String>())
        .find(|year| year.parse().is_ok_and(|y: i32| PLAUSIBLE_YEARS.contains(&y)))
        .unwrap_or_default()
}

fn issue_count(filename: &str, issue_end: usize) -> String {
    let tail = fix_spaces(filename.get(issue_end..).unwrap_or_default(), true);
    COUNT_OF_REGEX
        .captures(&tail)
        .or_else(|| COUNT_PAREN_REGEX.captures(&tail))
        .map(|caps| caps[1].trim_start_matches('0').to_string())
        .unwrap_or_default()
}

/// Whatever is left once series, issue, volume, year and count are gone.
fn remainder(filename: &str, year: &str, count: &str, volume: &str, issue_end: usize) -> String {
    let rest = match filename.split_once("--").or_else(|| filename.split_once("__")) {
        Some((_, rest)) => rest,
        None if issue_end != 0 => filename.get(issue_end..).unwrap_or_default(),
        None => "",
    };
    let mut rest = fix_spaces(rest, false);
    if !volume.is_empty() {
        rest = rest.replacen(&format!("Vol.{volume}"), "", 1);
    }
    if !year.is_empty() {
        rest = rest.replacen(year, "", 1);
    }
    if !count.is_empty() {
        rest = rest.replacen(&format!("of {count}"), "", 1);
    }
    rest.replace("()", "").replace("  ", " ").trim().to_string()
}

/// Strip leading zeros, keeping a lone "0" and turning ".5" into "0.5".
fn clean_issue(issue: &str) -> String {
    if issue.is_empty() {
        return String::new();
    }
    let stripped = issue.trim_start_matches('0');
    match stripped.chars().next() {
        None => "0".to_string(),
        Some('.') => format!("0{stripped}"),
        Some(_) => stripped.to_string(),
    }
}

fn non_empty(value: String) -> Option<String> {
    match value.is_empty() {
        true => None,
        false => Some(value),
    }
}
