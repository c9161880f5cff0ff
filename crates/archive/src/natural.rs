//! Natural ("human") ordering of archive member names.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Number(&'a str),
    Text(String),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(chunk(&s[start..i], prev));
                start = i;
            },
            _ => {},
        }
        in_digits = Some(digit);
    }
    if let Some(prev) = in_digits {
        out.push(chunk(&s[start..], prev));
    }
    out
}

fn chunk(s: &str, digits: bool) -> Chunk<'_> {
    match digits {
        true => Chunk::Number(s),
        false => Chunk::Text(s.to_lowercase()),
    }
}

fn cmp_numbers(a: &str, b: &str) -> Ordering {
    let (ta, tb) = (a.trim_start_matches('0'), b.trim_start_matches('0'));
    ta.len().cmp(&tb.len()).then_with(|| ta.cmp(tb))
}

/// Case-insensitive comparison that orders digit runs by numeric value, so
/// `page2.jpg` sorts before `page10.jpg`.
///
/// Names that only differ in case or leading zeros fall back to a plain
/// byte comparison to keep the order total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Number(x), Chunk::Number(y)) => cmp_numbers(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        names.sort_by(|a, b| natural_cmp(a, b));
        names
    }

    #[test]
    fn test_numbers_sort_by_value() {
        assert_eq!(sorted(&["page2.jpg", "page10.jpg", "page1.jpg"]), ["page1.jpg", "page2.jpg", "page10.jpg"]);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(sorted(&["B.jpg", "a.jpg", "C.jpg"]), ["a.jpg", "B.jpg", "C.jpg"]);
    }

    #[test]
    fn test_leading_zeros() {
        assert_eq!(sorted(&["010.jpg", "9.jpg", "001.jpg"]), ["001.jpg", "9.jpg", "010.jpg"]);
    }

    #[test]
    fn test_numbers_before_words() {
        assert_eq!(sorted(&["scan.jpg", "005.jpg", "001.jpg"]), ["001.jpg", "005.jpg", "scan.jpg"]);
    }

    #[test]
    fn test_directories_are_part_of_the_key() {
        assert_eq!(
            sorted(&["ch10/p1.jpg", "ch2/p10.jpg", "ch2/p9.jpg"]),
            ["ch2/p9.jpg", "ch2/p10.jpg", "ch10/p1.jpg"]
        );
    }

    #[test]
    fn test_total_order_for_equivalent_names() {
        assert_eq!(natural_cmp("01.jpg", "1.jpg"), "01.jpg".cmp("1.jpg"));
        assert_eq!(natural_cmp("a.jpg", "a.jpg"), Ordering::Equal);
    }
}
