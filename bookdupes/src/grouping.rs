//! Duplicate grouping
//!
//! Items are bucketed by a key built from normalized metadata. Only buckets
//! with at least two members leave this module.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bookdupes_common::CatalogItem;

use crate::normalize::{normalize, normalize_opt};

/// Joins key components; normalization strips control characters so this never
/// occurs inside a component
pub const KEY_SEPARATOR: char = '\u{1f}';

/// Which metadata fields make two items "the same book"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    #[default]
    Title,
    TitleAuthor,
    TitleSeries,
}

impl GroupBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Title => "title",
            GroupBy::TitleAuthor => "title+author",
            GroupBy::TitleSeries => "title+series",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(GroupBy::Title),
            "title+author" => Ok(GroupBy::TitleAuthor),
            "title+series" => Ok(GroupBy::TitleSeries),
            other => Err(format!(
                "unknown grouping '{}' (expected title, title+author or title+series)",
                other
            )),
        }
    }
}

/// Grouping options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupingPolicy {
    pub by: GroupBy,
    /// Prefer the "ignore prefix" title (e.g. "Hobbit, The") when present
    pub use_ignore_prefix_title: bool,
    pub case_sensitive: bool,
}

impl Default for GroupingPolicy {
    fn default() -> Self {
        Self {
            by: GroupBy::Title,
            use_ignore_prefix_title: true,
            case_sensitive: false,
        }
    }
}

/// Two or more items sharing a grouping key
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateGroup {
    pub key: String,
    /// Members in catalog listing order
    pub items: Vec<CatalogItem>,
}

impl DuplicateGroup {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First member, used for display
    pub fn representative(&self) -> &CatalogItem {
        &self.items[0]
    }
}

fn grouping_title(item: &CatalogItem, policy: &GroupingPolicy) -> String {
    let ignore_prefix = item
        .title_ignore_prefix
        .as_deref()
        .filter(|t| policy.use_ignore_prefix_title && !t.is_empty());
    normalize(
        ignore_prefix.or(item.title.as_deref()).unwrap_or(""),
        policy.case_sensitive,
    )
}

/// Grouping key for one item, `None` when the item has no normalizable title
pub fn grouping_key(item: &CatalogItem, policy: &GroupingPolicy) -> Option<String> {
    let title = grouping_title(item, policy);
    if title.is_empty() {
        return None;
    }

    let second = match policy.by {
        GroupBy::Title => return Some(title),
        GroupBy::TitleAuthor => normalize_opt(item.author_name.as_deref(), policy.case_sensitive),
        GroupBy::TitleSeries => normalize_opt(item.series_name.as_deref(), policy.case_sensitive),
    };

    let mut key = title;
    key.push(KEY_SEPARATOR);
    key.push_str(&second);
    Some(key)
}

/// Partition items into duplicate groups
///
/// Groups come back in the order their key was first seen; singletons and
/// items without a title are dropped.
pub fn group_duplicates(items: &[CatalogItem], policy: &GroupingPolicy) -> Vec<DuplicateGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<DuplicateGroup> = Vec::new();

    for item in items {
        let Some(key) = grouping_key(item, policy) else {
            continue;
        };
        match index.get(&key) {
            Some(&slot) => buckets[slot].items.push(item.clone()),
            None => {
                index.insert(key.clone(), buckets.len());
                buckets.push(DuplicateGroup {
                    key,
                    items: vec![item.clone()],
                });
            }
        }
    }

    buckets.retain(|group| group.len() >= 2);
    buckets
}
