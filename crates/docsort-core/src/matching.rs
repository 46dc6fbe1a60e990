//! Keyword classification of extracted document text.

use crate::category::{Category, MatchMode};

/// Return the first category in `categories` whose keywords match `text_lower`.
///
/// `text_lower` must already be lowercase; it is not lowercased again here.
/// Categories are tried in list order, so earlier categories take precedence
/// when several would match. `None` means the document stays unclassified.
pub fn classify<'a>(
    text_lower: &str,
    categories: &'a [Category],
    mode: MatchMode,
) -> Option<&'a Category> {
    categories
        .iter()
        .find(|category| category_matches(text_lower, category, mode))
}

/// Match predicate for a single category.
///
/// A category without keywords never matches, in either mode.
pub fn category_matches(text_lower: &str, category: &Category, mode: MatchMode) -> bool {
    let keywords = category.keywords();
    if keywords.is_empty() {
        return false;
    }
    match mode {
        MatchMode::Any => keywords.iter().any(|k| text_lower.contains(k.as_str())),
        MatchMode::All => keywords.iter().all(|k| text_lower.contains(k.as_str())),
    }
}
