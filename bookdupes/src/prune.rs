//! Duplicate pruning
//!
//! Each group goes through the same fixed sequence exactly once:
//! partition by format, choose the format to keep, choose the keeper inside
//! that format, dispose of the other copies' files, delete their catalog
//! entries, then strip the marker tag from the keeper.
//!
//! Per-item failures are logged and counted; they never stop the group.

use std::collections::BTreeMap;
use std::path::Path;

use bookdupes_common::{CatalogApi, CatalogItem, DeleteOutcome};
use tracing::{error, info, warn};

use crate::chooser::FormatChooser;
use crate::file_ops::FileActions;
use crate::formats::{dominant_format, UNKNOWN_FORMAT};
use crate::grouping::DuplicateGroup;
use crate::keeper::select_keeper;
use crate::report::{GroupEntry, RunStats};
use crate::safety;
use crate::settings::{FileAction, PruneSettings, RunSettings};
use crate::tagging::marker_removal;

/// Group members bucketed by dominant format, formats in sorted order
pub fn partition_by_format(items: &[CatalogItem]) -> BTreeMap<String, Vec<&CatalogItem>> {
    let mut buckets: BTreeMap<String, Vec<&CatalogItem>> = BTreeMap::new();
    for item in items {
        buckets.entry(dominant_format(item)).or_default().push(item);
    }
    buckets
}

/// First preferred format present, else the alphabetically first one
pub fn default_format<V>(buckets: &BTreeMap<String, V>, preferred: &[String]) -> Option<String> {
    preferred
        .iter()
        .find(|f| buckets.contains_key(*f))
        .or_else(|| buckets.keys().next())
        .cloned()
}

/// Which copy survives and which go
#[derive(Debug, Clone, PartialEq)]
pub struct PruneDecision<'a> {
    pub keep_format: String,
    pub keeper: &'a CatalogItem,
    /// Every other member of the group, in group order
    pub to_remove: Vec<&'a CatalogItem>,
}

/// Result of choosing a format for one group
#[derive(Debug, Clone, PartialEq)]
pub enum Decision<'a> {
    Resolved(PruneDecision<'a>),
    /// The chosen format has no copies; nothing is removed
    Unresolved { keep_format: String },
}

/// Pick the surviving copy of a group
///
/// Non-interactive settings take the default format; otherwise `chooser`
/// is asked with the same default.
pub fn decide<'a>(
    group: &'a DuplicateGroup,
    settings: &PruneSettings,
    chooser: &mut dyn FormatChooser,
) -> Decision<'a> {
    let buckets = partition_by_format(&group.items);
    let formats: Vec<String> = buckets.keys().cloned().collect();
    let Some(default) = default_format(&buckets, &settings.preferred_formats) else {
        return Decision::Unresolved {
            keep_format: UNKNOWN_FORMAT.to_string(),
        };
    };

    let title = group.representative().display_title();
    let keep_format = if settings.assume_yes {
        info!(
            "[PRUNE] '{}': formats {} -> keeping {} (auto)",
            title,
            formats.join(", "),
            default
        );
        default
    } else {
        chooser.choose(title, &formats, &default)
    };

    let keeper = buckets
        .get(&keep_format)
        .and_then(|bucket| select_keeper(bucket.iter().copied()));
    let Some(keeper) = keeper else {
        warn!(
            "[PRUNE] '{}': no copy in format {}; leaving group unresolved",
            title, keep_format
        );
        return Decision::Unresolved { keep_format };
    };

    let to_remove = group
        .items
        .iter()
        .filter(|item| item.id != keeper.id)
        .collect();
    Decision::Resolved(PruneDecision {
        keep_format,
        keeper,
        to_remove,
    })
}

/// Carries out prune decisions against the catalog and the filesystem
pub struct Pruner<'a, C: ?Sized, F: ?Sized> {
    catalog: &'a C,
    files: &'a F,
    settings: &'a RunSettings,
    file_action: FileAction,
}

impl<'a, C, F> Pruner<'a, C, F>
where
    C: CatalogApi + ?Sized,
    F: FileActions + ?Sized,
{
    pub fn new(catalog: &'a C, files: &'a F, settings: &'a RunSettings) -> Self {
        Self {
            catalog,
            files,
            settings,
            file_action: settings.pruning.effective_file_action(),
        }
    }

    /// Decide and execute for one group, recording into `entry` and `stats`
    pub async fn prune_group(
        &self,
        group: &DuplicateGroup,
        chooser: &mut dyn FormatChooser,
        entry: &mut GroupEntry,
        stats: &mut RunStats,
    ) {
        let decision = match decide(group, &self.settings.pruning, chooser) {
            Decision::Resolved(decision) => decision,
            Decision::Unresolved { keep_format } => {
                entry.keep_format = Some(keep_format);
                entry.unresolved = true;
                stats.unresolved_groups += 1;
                return;
            }
        };

        entry.keep_format = Some(decision.keep_format.clone());
        entry.to_delete_count = decision.to_remove.len();
        stats.prune_books += 1;

        for item in &decision.to_remove {
            self.dispose_files(item, entry, stats);
        }
        for item in &decision.to_remove {
            self.purge_catalog_entry(item, entry, stats).await;
        }
        if self.settings.pruning.clean_tags_after_prune && self.settings.pruning.assume_yes {
            self.reconcile_keeper_tags(decision.keeper, entry, stats).await;
        }
    }

    fn dispose_files(&self, item: &CatalogItem, entry: &mut GroupEntry, stats: &mut RunStats) {
        let pruning = &self.settings.pruning;
        let Some(verdict) = safety::evaluate(item, &pruning.path_map, &pruning.allow_roots) else {
            warn!("    Could not determine folder for {}; skipping file ops", item.id);
            entry.errors += 1;
            stats.errors += 1;
            return;
        };
        let mapped = verdict.mapped;

        if self.file_action == FileAction::Off {
            info!("    delete_files=off -> leaving files: {}", mapped.display());
            return;
        }
        if !verdict.within_roots {
            info!("    [SKIP] {} is outside allow_roots; not touching files", mapped.display());
            entry.record_skipped_path(mapped);
            stats.files_skipped_outside_roots += 1;
            return;
        }

        if !self.settings.apply {
            match self.file_action {
                FileAction::Trash => {
                    info!("    [DRY-RUN] Would move to trash: {}", mapped.display());
                    entry.file_moved += 1;
                }
                FileAction::Remove => {
                    info!("    [DRY-RUN] Would delete: {}", mapped.display());
                    entry.file_deleted += 1;
                }
                FileAction::Off => {}
            }
            return;
        }

        match self.file_action {
            FileAction::Trash => self.trash(&mapped, entry, stats),
            FileAction::Remove => match self.files.remove_path(&mapped) {
                Ok(()) => {
                    info!("    Deleted: {}", mapped.display());
                    entry.file_deleted += 1;
                    stats.files_deleted += 1;
                }
                Err(e) => {
                    error!("    {}", e);
                    entry.errors += 1;
                    stats.errors += 1;
                }
            },
            FileAction::Off => {}
        }
    }

    fn trash(&self, path: &Path, entry: &mut GroupEntry, stats: &mut RunStats) {
        let pruning = &self.settings.pruning;
        match self
            .files
            .move_to_trash(path, &pruning.trash_dir, &pruning.allow_roots)
        {
            Ok(dest) => {
                info!("    Moved: {} -> {}", path.display(), dest.display());
                entry.file_moved += 1;
                stats.files_moved += 1;
            }
            Err(e) => {
                error!("    {}", e);
                entry.errors += 1;
                stats.errors += 1;
            }
        }
    }

    async fn purge_catalog_entry(
        &self,
        item: &CatalogItem,
        entry: &mut GroupEntry,
        stats: &mut RunStats,
    ) {
        if !self.settings.apply {
            info!("    [DRY-RUN] Would delete catalog item {}", item.id);
            return;
        }
        match self.catalog.delete_item(&item.id).await {
            Ok(outcome) => {
                if outcome == DeleteOutcome::AlreadyAbsent {
                    info!("    Catalog item {} was already gone", item.id);
                } else {
                    info!("    Deleted catalog item {}", item.id);
                }
                entry.catalog_deleted += 1;
                stats.catalog_deleted += 1;
            }
            Err(e) => {
                error!("    Catalog delete {} failed: {}", item.id, e);
                entry.errors += 1;
                stats.errors += 1;
            }
        }
    }

    async fn reconcile_keeper_tags(
        &self,
        keeper: &CatalogItem,
        entry: &mut GroupEntry,
        stats: &mut RunStats,
    ) {
        let marker = &self.settings.marker_tag;
        let update = marker_removal(keeper, marker);
        if self.settings.apply {
            if let Err(e) = self.catalog.batch_update_tags(&[update]).await {
                error!("    Removing '{}' from {} failed: {}", marker, keeper.id, e);
                entry.errors += 1;
                stats.errors += 1;
                return;
            }
        } else {
            info!("    [DRY-RUN] Would remove '{}' from kept copy: {}", marker, keeper.id);
        }
        entry.kept_tag_removed = true;
        stats.tag_removed_survivors += 1;
    }
}
