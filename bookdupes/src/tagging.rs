//! Marker tag reconciliation
//!
//! Tag changes are always full replacement sets: the item's current tags
//! plus or minus the marker.

use bookdupes_common::{CatalogApi, CatalogItem, Result, TagUpdate};
use tracing::{info, warn};

/// Planned marker changes for one duplicate group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagPlan {
    pub updates: Vec<TagUpdate>,
    /// Members already carrying the marker
    pub skipped: usize,
}

impl TagPlan {
    pub fn added(&self) -> usize {
        self.updates.len()
    }
}

/// Decide which group members get the marker
///
/// Every member except `keeper_id` is tagged; with `tag_all` the keeper is
/// tagged too. Members that already have the marker are counted, not updated.
pub fn plan_marker_tags(
    items: &[CatalogItem],
    keeper_id: &str,
    marker: &str,
    tag_all: bool,
) -> TagPlan {
    let mut plan = TagPlan::default();
    for item in items {
        if !tag_all && item.id == keeper_id {
            continue;
        }
        if item.has_tag(marker) {
            info!("    skip {} (already has '{}')", item.id, marker);
            plan.skipped += 1;
            continue;
        }
        info!("    tag  {} -> +'{}'", item.id, marker);
        plan.updates.push(TagUpdate::new(item.id.clone(), item.tags_with(marker)));
    }
    plan
}

/// Tag set for a surviving copy once its duplicates are gone
pub fn marker_removal(keeper: &CatalogItem, marker: &str) -> TagUpdate {
    TagUpdate::new(keeper.id.clone(), keeper.tags_without(marker))
}

/// Submit updates in batches; a server count mismatch is only logged
pub async fn apply_tag_updates<C>(catalog: &C, updates: &[TagUpdate]) -> Result<u64>
where
    C: CatalogApi + ?Sized,
{
    if updates.is_empty() {
        return Ok(0);
    }
    info!("Applying {} tag updates...", updates.len());
    let changed = catalog.batch_update_tags(updates).await?;
    if changed != updates.len() as u64 {
        warn!(
            "Server reported {} item(s) updated out of {} requested",
            changed,
            updates.len()
        );
    }
    Ok(changed)
}
