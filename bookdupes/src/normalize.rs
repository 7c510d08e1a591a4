//! Text normalization for grouping keys

use unicode_normalization::UnicodeNormalization;

/// Canonicalize free text so that trivially different spellings compare equal
///
/// Folds accents and compatibility forms by NFKD decomposition, drops anything
/// left that is not printable ASCII, collapses whitespace runs to a single
/// space, trims, and lowercases unless `case_sensitive`. Case folding comes
/// last since NFKD can turn uncased symbols into capital letters. Control
/// characters never survive, which keeps [`crate::grouping::KEY_SEPARATOR`]
/// out of normalized text.
pub fn normalize(text: &str, case_sensitive: bool) -> String {
    let folded: String = text
        .nfkd()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| c.is_ascii() && !c.is_ascii_control())
        .collect();
    let collapsed = folded
        .split(' ')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if case_sensitive {
        collapsed
    } else {
        collapsed.to_ascii_lowercase()
    }
}

/// [`normalize`] for optional fields; absent text normalizes to ""
pub fn normalize_opt(text: Option<&str>, case_sensitive: bool) -> String {
    text.map(|t| normalize(t, case_sensitive)).unwrap_or_default()
}
