//! Run accounting and the end-of-run summary
//!
//! One [`RunReport`] exists per run. The orchestrator owns it and hands
//! mutable pieces to each phase; no component keeps its own counters.

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;

use bookdupes_common::{CatalogItem, Library};

use crate::formats::{dominant_format, UNKNOWN_FORMAT};

/// At most this many outside-root paths are kept per group
pub const MAX_SKIPPED_PATHS: usize = 2;

/// Run-wide counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub libraries_total: usize,
    pub libraries_selected: usize,
    pub libraries_scanned: usize,
    pub items_total: usize,
    pub dupe_books: usize,
    pub tags_added: usize,
    pub tags_skipped: usize,
    /// Planned marker tags whose batch submission failed
    pub tags_failed: usize,
    pub prune_books: usize,
    pub unresolved_groups: usize,
    pub files_moved: usize,
    pub files_deleted: usize,
    pub files_skipped_outside_roots: usize,
    pub catalog_deleted: usize,
    pub tag_removed_survivors: usize,
    pub errors: usize,
}

/// Outcome record for one duplicate group
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupEntry {
    pub title: String,
    pub author: Option<String>,
    /// Dominant format → number of copies
    pub format_counts: BTreeMap<String, usize>,
    /// Earliest-added copy (tagging keeper)
    pub keeper_id: String,
    pub tag_added: usize,
    pub tag_skipped: usize,
    pub tag_failed: usize,
    pub keep_format: Option<String>,
    /// Set when the chosen format had no copies and nothing was pruned
    pub unresolved: bool,
    pub to_delete_count: usize,
    pub file_moved: usize,
    pub file_deleted: usize,
    pub file_skipped: usize,
    pub skipped_paths: Vec<PathBuf>,
    pub catalog_deleted: usize,
    pub kept_tag_removed: bool,
    pub errors: usize,
    /// Counts above describe intended actions only
    pub dry_run: bool,
}

impl GroupEntry {
    pub fn new(items: &[CatalogItem], keeper_id: &str, dry_run: bool) -> Self {
        let mut format_counts = BTreeMap::new();
        for item in items {
            *format_counts.entry(dominant_format(item)).or_insert(0) += 1;
        }
        let first = items.first();
        Self {
            title: first
                .map(|i| i.display_title().to_string())
                .unwrap_or_else(|| "(no title)".to_string()),
            author: first
                .and_then(|i| i.author_name.clone())
                .filter(|a| !a.is_empty()),
            format_counts,
            keeper_id: keeper_id.to_string(),
            dry_run,
            ..Default::default()
        }
    }

    pub fn formats(&self) -> Vec<&str> {
        self.format_counts.keys().map(String::as_str).collect()
    }

    /// Remember an outside-root path, keeping the first few only
    pub fn record_skipped_path(&mut self, path: PathBuf) {
        self.file_skipped += 1;
        if self.skipped_paths.len() < MAX_SKIPPED_PATHS {
            self.skipped_paths.push(path);
        }
    }
}

/// Outcomes for one library
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryReport {
    pub id: String,
    pub name: String,
    pub entries: Vec<GroupEntry>,
}

/// Everything a run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub stats: RunStats,
    pub libraries: Vec<LibraryReport>,
}

impl RunReport {
    /// Index of the library's report, created on first use
    pub fn library_index(&mut self, library: &Library) -> usize {
        if let Some(pos) = self.libraries.iter().position(|l| l.id == library.id) {
            return pos;
        }
        self.libraries.push(LibraryReport {
            id: library.id.clone(),
            name: library.display_name().to_string(),
            entries: Vec::new(),
        });
        self.libraries.len() - 1
    }

    /// Append an entry to a library's report and return where it lives
    pub fn push_entry(&mut self, library: &Library, entry: GroupEntry) -> EntryHandle {
        let library_idx = self.library_index(library);
        let entries = &mut self.libraries[library_idx].entries;
        entries.push(entry);
        EntryHandle {
            library: library_idx,
            entry: entries.len() - 1,
        }
    }

    /// Reclassify every planned marker tag as failed after a rejected batch
    pub fn mark_tags_failed(&mut self) {
        for entry in self.libraries.iter_mut().flat_map(|l| l.entries.iter_mut()) {
            entry.tag_failed += entry.tag_added;
            entry.tag_added = 0;
        }
        self.stats.tags_failed += self.stats.tags_added;
        self.stats.tags_added = 0;
    }
}

/// Position of a [`GroupEntry`] inside a [`RunReport`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryHandle {
    pub library: usize,
    pub entry: usize,
}

/// Settings that change how the summary reads
#[derive(Debug, Clone)]
pub struct SummaryOptions {
    pub apply: bool,
    pub prune: bool,
    pub tag: String,
}

const RULE_WIDTH: usize = 72;

fn format_line(entry: &GroupEntry) -> String {
    if entry.format_counts.is_empty() {
        return UNKNOWN_FORMAT.to_string();
    }
    if entry.format_counts.keys().all(|f| f == UNKNOWN_FORMAT) {
        return "unknown (catalog returned no file extensions or MIME types)".to_string();
    }
    entry
        .format_counts
        .iter()
        .map(|(fmt, count)| format!("{}×{}", fmt, count))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_entry(out: &mut String, entry: &GroupEntry, options: &SummaryOptions) {
    let author = entry
        .author
        .as_deref()
        .map(|a| format!(" - {}", a))
        .unwrap_or_default();
    let _ = writeln!(out, "  • {}{} | formats: {}", entry.title, author, format_line(entry));

    if entry.tag_added > 0 || entry.tag_skipped > 0 || entry.tag_failed > 0 {
        let mut bits = Vec::new();
        if entry.tag_added > 0 {
            bits.push(format!("added '{}' to {} item(s)", options.tag, entry.tag_added));
        }
        if entry.tag_failed > 0 {
            bits.push(format!(
                "failed to add '{}' to {} item(s)",
                options.tag, entry.tag_failed
            ));
        }
        if entry.tag_skipped > 0 {
            bits.push(format!("skipped {} (already tagged)", entry.tag_skipped));
        }
        let _ = writeln!(out, "    Tagging: {}", bits.join("; "));
    }

    if !options.prune {
        return;
    }

    let Some(keep_format) = entry.keep_format.as_deref() else {
        let _ = writeln!(out, "    Outcome: (no prune decision; formats not detected)");
        return;
    };

    if entry.unresolved {
        let _ = writeln!(
            out,
            "    Outcome: no copy in chosen format {}; nothing pruned",
            keep_format
        );
        return;
    }

    if entry.dry_run {
        let mut line = format!(
            "    Outcome: would keep {}; would delete {} other copy/copies. \
             Files: would move {}, delete {}, skipped {}.",
            keep_format,
            entry.to_delete_count,
            entry.file_moved,
            entry.file_deleted,
            entry.file_skipped
        );
        if entry.kept_tag_removed {
            line.push_str(&format!(" Would remove '{}' tag from kept copy.", options.tag));
        }
        let _ = writeln!(out, "{}", line);
        if let Some(path) = entry.skipped_paths.first() {
            let _ = writeln!(
                out,
                "      Reason: skipped outside allow_roots (e.g., {})",
                path.display()
            );
        }
    } else {
        let mut line = format!(
            "    Outcome: kept {}; deleted {} other copy/copies. \
             Files: moved {}, deleted {}, skipped {}.",
            keep_format,
            entry.catalog_deleted,
            entry.file_moved,
            entry.file_deleted,
            entry.file_skipped
        );
        if entry.kept_tag_removed {
            line.push_str(&format!(" Removed '{}' tag from kept copy.", options.tag));
        }
        if entry.errors > 0 {
            line.push_str(&format!(" Errors: {}.", entry.errors));
        }
        let _ = writeln!(out, "{}", line);
        if let Some(path) = entry.skipped_paths.first() {
            let _ = writeln!(
                out,
                "      Note: skipped outside allow_roots (e.g., {})",
                path.display()
            );
        }
    }
}

/// Human-readable end-of-run summary
pub fn render_summary(report: &RunReport, options: &SummaryOptions) -> String {
    let stats = &report.stats;
    let mut out = String::new();
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);

    let _ = writeln!(out, "\n{}", heavy);
    let _ = writeln!(out, "SUMMARY");
    let _ = writeln!(out, "{}", light);
    let mode = if options.apply {
        "APPLY (changes performed)"
    } else {
        "DRY RUN (no changes)"
    };
    let _ = writeln!(out, "Mode: {}", mode);
    let _ = writeln!(
        out,
        "Libraries scanned: {} of {} book libraries",
        stats.libraries_scanned, stats.libraries_total
    );
    let _ = writeln!(out, "Items scanned: {}", stats.items_total);
    let _ = writeln!(out, "Books with duplicates: {}", stats.dupe_books);
    if options.prune {
        let _ = writeln!(
            out,
            "Pruned groups: {} (unresolved: {})",
            stats.prune_books, stats.unresolved_groups
        );
    }
    if stats.tags_failed > 0 {
        let _ = writeln!(out, "Tag updates failed: {} (not applied)", stats.tags_failed);
    }
    if stats.errors > 0 {
        let _ = writeln!(out, "Errors: {}", stats.errors);
    }
    let _ = writeln!(out, "{}", light);

    if report.libraries.is_empty() {
        let _ = writeln!(out, "No duplicate books found.");
    }
    for library in &report.libraries {
        let _ = writeln!(out, "\nLibrary: {} ({})", library.name, library.id);
        if library.entries.is_empty() {
            let _ = writeln!(out, "  No duplicate books.");
            continue;
        }
        for entry in &library.entries {
            write_entry(&mut out, entry, options);
        }
    }
    let _ = writeln!(out, "{}", heavy);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookdupes_common::LibraryFile;

    fn item(id: &str, ext: &str) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            title: Some("Dune".to_string()),
            author_name: Some("Frank Herbert".to_string()),
            library_files: vec![LibraryFile {
                file_type: Some("audio".to_string()),
                ext: Some(ext.to_string()),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn options(apply: bool) -> SummaryOptions {
        SummaryOptions {
            apply,
            prune: true,
            tag: "Duplicate".to_string(),
        }
    }

    #[test]
    fn test_entry_counts_formats() {
        let items = vec![item("a", "m4b"), item("b", "mp3"), item("c", "mp3")];
        let entry = GroupEntry::new(&items, "a", true);
        assert_eq!(entry.formats(), vec!["m4b", "mp3"]);
        assert_eq!(entry.format_counts["mp3"], 2);
        assert_eq!(entry.author.as_deref(), Some("Frank Herbert"));
    }

    #[test]
    fn test_skipped_paths_are_bounded() {
        let mut entry = GroupEntry::default();
        for i in 0..5 {
            entry.record_skipped_path(PathBuf::from(format!("/outside/{}", i)));
        }
        assert_eq!(entry.file_skipped, 5);
        assert_eq!(entry.skipped_paths.len(), MAX_SKIPPED_PATHS);
    }

    #[test]
    fn test_library_index_reuses_existing() {
        let mut report = RunReport::default();
        let lib = Library {
            id: "l1".to_string(),
            name: Some("Audiobooks".to_string()),
            media_type: Some("book".to_string()),
        };
        let first = report.push_entry(&lib, GroupEntry::default());
        let second = report.push_entry(&lib, GroupEntry::default());
        assert_eq!(report.libraries.len(), 1);
        assert_eq!(first.library, second.library);
        assert_eq!(second.entry, 1);
    }

    #[test]
    fn test_summary_dry_run_wording() {
        let mut report = RunReport::default();
        let lib = Library {
            id: "l1".to_string(),
            name: Some("Audiobooks".to_string()),
            media_type: Some("book".to_string()),
        };
        let mut entry = GroupEntry::new(&[item("a", "m4b"), item("b", "mp3")], "a", true);
        entry.keep_format = Some("m4b".to_string());
        entry.to_delete_count = 1;
        entry.tag_added = 1;
        entry.record_skipped_path(PathBuf::from("/outside/Dune"));
        report.push_entry(&lib, entry);

        let text = render_summary(&report, &options(false));
        assert!(text.contains("Mode: DRY RUN (no changes)"));
        assert!(text.contains("Library: Audiobooks (l1)"));
        assert!(text.contains("formats: m4b×1, mp3×1"));
        assert!(text.contains("would keep m4b; would delete 1"));
        assert!(text.contains("Reason: skipped outside allow_roots (e.g., /outside/Dune)"));
        assert!(text.contains("added 'Duplicate' to 1 item(s)"));
    }

    #[test]
    fn test_summary_unknown_formats_and_unresolved() {
        let mut report = RunReport::default();
        let lib = Library {
            id: "l1".to_string(),
            name: None,
            media_type: Some("book".to_string()),
        };
        let bare = CatalogItem {
            id: "x".to_string(),
            title: Some("Emma".to_string()),
            ..Default::default()
        };
        let mut entry = GroupEntry::new(&[bare.clone(), bare], "x", false);
        entry.keep_format = Some("flac".to_string());
        entry.unresolved = true;
        report.push_entry(&lib, entry);

        let text = render_summary(&report, &options(true));
        assert!(text.contains("unknown (catalog returned no file extensions or MIME types)"));
        assert!(text.contains("no copy in chosen format flac; nothing pruned"));
    }

    #[test]
    fn test_summary_without_duplicates() {
        let text = render_summary(&RunReport::default(), &options(true));
        assert!(text.contains("No duplicate books found."));
        assert!(text.contains("Mode: APPLY (changes performed)"));
    }
}
