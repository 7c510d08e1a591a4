//! Path safety guard
//!
//! Nothing on disk is touched unless the item's folder, after remapping from
//! the server's view to the local view, resolves inside one of the allowed
//! roots. Resolution follows symlinks for the part of the path that exists;
//! anything that cannot be resolved is treated as outside.

use std::io;
use std::path::{Component, Path, PathBuf};

use bookdupes_common::CatalogItem;

/// Where an item lives on disk and whether it may be touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyVerdict {
    /// Folder as reported by the catalog
    pub folder: PathBuf,
    /// Folder after path remapping
    pub mapped: PathBuf,
    pub within_roots: bool,
}

/// Folder holding an item's files
///
/// Uses the item-level path when present; otherwise the deepest directory
/// shared by all audio files, or the first audio file's directory when the
/// files share nothing.
pub fn resolve_item_folder(item: &CatalogItem) -> Option<PathBuf> {
    if let Some(path) = item.path.as_deref().filter(|p| !p.trim().is_empty()) {
        return Some(PathBuf::from(path));
    }

    let dirs: Vec<PathBuf> = item
        .audio_files()
        .filter_map(|f| f.best_path())
        .filter_map(|p| Path::new(p).parent())
        .filter(|d| !d.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .collect();

    let first = dirs.first()?.clone();
    Some(common_ancestor(&dirs).unwrap_or(first))
}

/// Deepest shared directory, `None` when mixed absolute/relative or disjoint
fn common_ancestor(dirs: &[PathBuf]) -> Option<PathBuf> {
    let first = dirs.first()?;
    let absolute = first.is_absolute();
    if dirs.iter().any(|d| d.is_absolute() != absolute) {
        return None;
    }

    let mut common: Vec<Component<'_>> = first.components().collect();
    for dir in &dirs[1..] {
        let shared = common
            .iter()
            .zip(dir.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        common.truncate(shared);
    }

    if common.is_empty() {
        return None;
    }
    Some(common.iter().collect())
}

/// Rewrite a server path into a local path
///
/// The first mapping whose source is a prefix of `path` wins; the rest of the
/// path (leading separators stripped) is joined onto the destination.
pub fn apply_path_map(path: &Path, mappings: &[(String, String)]) -> PathBuf {
    let text = path.to_string_lossy();
    for (src, dst) in mappings {
        if src.is_empty() {
            continue;
        }
        if let Some(rest) = text.strip_prefix(src.as_str()) {
            let tail = rest.trim_start_matches(['/', '\\']);
            return Path::new(dst).join(tail);
        }
    }
    path.to_path_buf()
}

/// Resolve symlinks in the existing part of `path` and append the rest
///
/// A `..` in the non-existent tail cannot be resolved safely and is an error.
pub fn resolve_real_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut existing = absolute.clone();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();
    loop {
        if existing.try_exists()? {
            break;
        }
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name.to_os_string());
                existing = parent.to_path_buf();
            }
            _ => {
                // Trailing `..` or an unresolvable prefix
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("cannot resolve {}", absolute.display()),
                ));
            }
        }
    }

    let mut resolved = std::fs::canonicalize(&existing)?;
    for name in tail.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}

/// The first root containing `path`, with `path`'s remainder below it
///
/// Both sides are compared in resolved form.
pub fn matching_root(path: &Path, roots: &[PathBuf]) -> Option<(PathBuf, PathBuf)> {
    let real = resolve_real_path(path).ok()?;
    roots.iter().find_map(|root| {
        let root_real = resolve_real_path(root).ok()?;
        let relative = real.strip_prefix(&root_real).ok()?.to_path_buf();
        Some((root_real, relative))
    })
}

/// Whether `path` lies inside (or is) one of `roots`
///
/// An empty root list means "unrestricted" and returns `true`; callers treat
/// that case as a reason to disable file actions altogether.
pub fn is_within_roots(path: &Path, roots: &[PathBuf]) -> bool {
    if roots.is_empty() {
        return true;
    }
    matching_root(path, roots).is_some()
}

/// Resolve, remap and gate one removal candidate
///
/// `None` when the item's folder cannot be determined.
pub fn evaluate(
    item: &CatalogItem,
    mappings: &[(String, String)],
    roots: &[PathBuf],
) -> Option<SafetyVerdict> {
    let folder = resolve_item_folder(item)?;
    let mapped = apply_path_map(&folder, mappings);
    let within_roots = is_within_roots(&mapped, roots);
    Some(SafetyVerdict {
        folder,
        mapped,
        within_roots,
    })
}
