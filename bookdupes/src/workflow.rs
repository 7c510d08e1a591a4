//! Run orchestration
//!
//! Phases, in order:
//! 1. Scan: list the selected libraries, group duplicates, plan marker tags
//! 2. Tag: submit all marker tags in batches (apply mode only)
//! 3. Prune: resolve each group (prune mode only)
//!
//! Only a failure to list libraries ends the run early; everything else is
//! counted into the report.

use bookdupes_common::{CatalogApi, Result, TagUpdate};
use tracing::{error, info, warn};

use crate::chooser::FormatChooser;
use crate::file_ops::FileActions;
use crate::grouping::{group_duplicates, DuplicateGroup};
use crate::keeper::select_keeper;
use crate::libraries::select_libraries;
use crate::prune::Pruner;
use crate::report::{EntryHandle, GroupEntry, RunReport};
use crate::settings::{FileAction, RunSettings};
use crate::tagging::{apply_tag_updates, plan_marker_tags};

/// Execute one full run and return its report
pub async fn run<C, F>(
    catalog: &C,
    files: &F,
    settings: &RunSettings,
    chooser: &mut dyn FormatChooser,
) -> Result<RunReport>
where
    C: CatalogApi + ?Sized,
    F: FileActions + ?Sized,
{
    let mut report = RunReport::default();

    if settings.pruning.file_action != FileAction::Off && settings.pruning.allow_roots.is_empty() {
        warn!(
            "delete_files={} but allow_roots is empty; file operations will be skipped",
            settings.pruning.file_action
        );
    }

    let all = catalog.list_libraries().await?;
    report.stats.libraries_total = all.iter().filter(|l| l.is_book_library()).count();
    let chosen = select_libraries(&all, &settings.libraries, &settings.library_ids);
    report.stats.libraries_selected = chosen.len();
    if chosen.is_empty() {
        warn!("No matching book libraries selected");
        return Ok(report);
    }

    let mut pending: Vec<TagUpdate> = Vec::new();
    let mut dup_sets: Vec<(EntryHandle, DuplicateGroup)> = Vec::new();

    for library in &chosen {
        info!("==> Library: {} ({})", library.display_name(), library.id);
        let items = match catalog.list_items(&library.id).await {
            Ok(items) => items,
            Err(e) => {
                error!("Listing items of {} failed: {}", library.id, e);
                report.stats.errors += 1;
                continue;
            }
        };
        report.stats.libraries_scanned += 1;
        report.stats.items_total += items.len();
        report.library_index(library);

        let groups = group_duplicates(&items, &settings.grouping);
        if groups.is_empty() {
            info!("  No duplicates (by {})", settings.grouping.by);
            continue;
        }

        for group in groups {
            let Some(keeper) = select_keeper(&group.items) else {
                continue;
            };
            info!(
                "  '{}': {} copies, keeper {}",
                group.representative().display_title(),
                group.len(),
                keeper.id
            );

            let plan = plan_marker_tags(
                &group.items,
                &keeper.id,
                &settings.marker_tag,
                settings.tag_all,
            );
            let mut entry = GroupEntry::new(&group.items, &keeper.id, !settings.apply);
            entry.tag_added = plan.added();
            entry.tag_skipped = plan.skipped;

            report.stats.dupe_books += 1;
            report.stats.tags_added += plan.added();
            report.stats.tags_skipped += plan.skipped;
            pending.extend(plan.updates);

            let handle = report.push_entry(library, entry);
            dup_sets.push((handle, group));
        }
    }

    if settings.apply {
        if let Err(e) = apply_tag_updates(catalog, &pending).await {
            error!("Tag update failed: {}", e);
            report.stats.errors += 1;
            report.mark_tags_failed();
        }
    } else if !pending.is_empty() {
        info!("[DRY-RUN] Would apply {} tag updates", pending.len());
    }

    if !settings.prune {
        return Ok(report);
    }

    if !settings.apply {
        info!("[PRUNE] dry-run only (no deletions); use --apply to delete");
    }
    let file_action = settings.pruning.effective_file_action();
    if file_action != FileAction::Off {
        info!(
            "[PRUNE] File action: {} (trash dir: {})",
            file_action,
            settings.pruning.trash_dir.display()
        );
    }

    let pruner = Pruner::new(catalog, files, settings);
    for (handle, group) in &dup_sets {
        let RunReport { stats, libraries } = &mut report;
        let entry = &mut libraries[handle.library].entries[handle.entry];
        pruner.prune_group(group, chooser, entry, stats).await;
    }

    Ok(report)
}
