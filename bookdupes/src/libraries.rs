//! Library selection

use bookdupes_common::Library;
use globset::{Glob, GlobMatcher};
use tracing::warn;

/// Wish-list entry meaning "every book library"
pub const ALL_LIBRARIES: &str = "ALL";

fn matcher(pattern: &str) -> Option<GlobMatcher> {
    match Glob::new(pattern) {
        Ok(glob) => Some(glob.compile_matcher()),
        Err(e) => {
            warn!("Ignoring invalid library pattern '{}': {}", pattern, e);
            None
        }
    }
}

/// Book libraries to process, in server order
///
/// Explicit IDs win over the wish list. An empty wish list (or one naming
/// `ALL`, in any case) selects every book library; otherwise a library is
/// selected when its ID equals an entry or its name matches an entry as a glob.
pub fn select_libraries(all: &[Library], wishes: &[String], ids: &[String]) -> Vec<Library> {
    let books = all.iter().filter(|lib| lib.is_book_library());

    if !ids.is_empty() {
        return books.filter(|lib| ids.contains(&lib.id)).cloned().collect();
    }

    if wishes.is_empty() || wishes.iter().any(|w| w.eq_ignore_ascii_case(ALL_LIBRARIES)) {
        return books.cloned().collect();
    }

    let patterns: Vec<GlobMatcher> = wishes.iter().filter_map(|w| matcher(w)).collect();
    books
        .filter(|lib| {
            wishes.contains(&lib.id)
                || lib
                    .name
                    .as_deref()
                    .map(|name| patterns.iter().any(|p| p.is_match(name)))
                    .unwrap_or(false)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib(id: &str, name: &str, media: &str) -> Library {
        Library {
            id: id.to_string(),
            name: Some(name.to_string()),
            media_type: Some(media.to_string()),
        }
    }

    fn catalog() -> Vec<Library> {
        vec![
            lib("l1", "Audiobooks", "book"),
            lib("l2", "Podcasts", "podcast"),
            lib("l3", "Kids Audiobooks", "book"),
        ]
    }

    fn ids(libs: &[Library]) -> Vec<&str> {
        libs.iter().map(|l| l.id.as_str()).collect()
    }

    #[test]
    fn test_empty_wishes_select_all_books() {
        assert_eq!(ids(&select_libraries(&catalog(), &[], &[])), vec!["l1", "l3"]);
        let all = vec!["ALL".to_string()];
        assert_eq!(ids(&select_libraries(&catalog(), &all, &[])), vec!["l1", "l3"]);
    }

    #[test]
    fn test_all_keyword_ignores_case() {
        for keyword in ["all", "All", "aLL"] {
            let wishes = vec!["Kids*".to_string(), keyword.to_string()];
            assert_eq!(ids(&select_libraries(&catalog(), &wishes, &[])), vec!["l1", "l3"]);
        }
    }

    #[test]
    fn test_explicit_ids_win() {
        let wishes = vec!["Audiobooks".to_string()];
        let explicit = vec!["l3".to_string(), "l2".to_string()];
        assert_eq!(ids(&select_libraries(&catalog(), &wishes, &explicit)), vec!["l3"]);
    }

    #[test]
    fn test_name_glob_and_id_match() {
        let wishes = vec!["Kids*".to_string()];
        assert_eq!(ids(&select_libraries(&catalog(), &wishes, &[])), vec!["l3"]);

        let by_id = vec!["l1".to_string()];
        assert_eq!(ids(&select_libraries(&catalog(), &by_id, &[])), vec!["l1"]);
    }

    #[test]
    fn test_no_match_selects_nothing() {
        let wishes = vec!["Podcasts".to_string()];
        assert!(select_libraries(&catalog(), &wishes, &[]).is_empty());
    }
}
