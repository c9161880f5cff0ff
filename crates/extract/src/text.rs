const ARTICLES: [&str; 5] = ["and", "a", "&", "issue", "the"];

/// Normalise a title for sorting and fuzzy comparison.
///
/// Lowercases, drops articles and connective words, strips colons and commas,
/// and turns dashes into spaces.
///
/// ```
/// assert_eq!(longbox_extract::remove_articles("The Champions & Inhumans"), "champions inhumans");
/// ```
pub fn remove_articles(text: impl AsRef<str>) -> String {
    let lowered = text.as_ref().to_lowercase();
    let kept: Vec<&str> = lowered.split(' ').filter(|word| !ARTICLES.contains(word)).collect();
    kept.join(" ").replace([':', ','], "").replace('-', " ")
}
