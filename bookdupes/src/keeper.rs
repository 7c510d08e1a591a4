//! Keeper selection

use bookdupes_common::CatalogItem;

/// Earliest-added item; ties keep list order
///
/// Returns `None` only for an empty slice.
pub fn select_keeper<'a, I>(items: I) -> Option<&'a CatalogItem>
where
    I: IntoIterator<Item = &'a CatalogItem>,
{
    // min_by_key returns the first of equal minima
    items.into_iter().min_by_key(|item| item.added_at)
}
