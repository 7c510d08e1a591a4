//! Destructive file operations
//!
//! Callers must have passed the path through [`crate::safety`] first; this
//! module only performs the move or delete.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bookdupes_common::time::now_suffix;
use thiserror::Error;
use walkdir::WalkDir;

use crate::safety::matching_root;

/// File operation errors
#[derive(Debug, Error)]
pub enum FileOpError {
    /// Could not create the trash directory tree
    #[error("Cannot create trash directory {0}: {1}")]
    TrashSetup(PathBuf, io::Error),

    /// Move into the trash failed
    #[error("Moving {src} to {dest} failed: {source}")]
    Move {
        src: PathBuf,
        dest: PathBuf,
        source: io::Error,
    },

    /// Permanent delete failed
    #[error("Deleting {0} failed: {1}")]
    Remove(PathBuf, io::Error),
}

/// What happens to an item's folder when its catalog entry is pruned
pub trait FileActions {
    /// Relocate `src` below `trash_root`, returning the destination
    fn move_to_trash(
        &self,
        src: &Path,
        trash_root: &Path,
        roots: &[PathBuf],
    ) -> Result<PathBuf, FileOpError>;

    /// Delete a directory tree or a single file
    fn remove_path(&self, src: &Path) -> Result<(), FileOpError>;
}

/// Operates on the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileActions;

/// Destination of `src` inside the trash
///
/// Mirrors the path below the allow-root that contains `src`; falls back to
/// the bare file name when no root matches. The returned path never names an
/// existing entry: a timestamp suffix is appended on collision, then a counter
/// when several copies land in the same second.
pub fn trash_destination(src: &Path, trash_root: &Path, roots: &[PathBuf]) -> PathBuf {
    let relative = matching_root(src, roots)
        .map(|(_, rel)| rel)
        .filter(|rel| !rel.as_os_str().is_empty())
        .or_else(|| src.file_name().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("item"));

    let dest = trash_root.join(relative);
    if !occupied(&dest) {
        return dest;
    }

    let stamp = now_suffix();
    let mut attempt = 0u32;
    loop {
        let mut name = dest.as_os_str().to_os_string();
        if attempt == 0 {
            name.push(format!(".{}", stamp));
        } else {
            name.push(format!(".{}-{}", stamp, attempt));
        }
        let candidate = PathBuf::from(name);
        if !occupied(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

/// Anything at `path`, including a dangling symlink
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

fn copy_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    if src.is_file() {
        fs::copy(src, dest)?;
        return Ok(());
    }
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn remove_any(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Rename, or copy then delete when the trash lives on another filesystem
fn move_path(src: &Path, dest: &Path) -> io::Result<()> {
    if occupied(dest) {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} already exists", dest.display()),
        ));
    }
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if is_cross_device(&e) => {
            tracing::debug!("rename crosses filesystems ({}), copying instead", e);
            if let Err(copy_err) = copy_recursive(src, dest) {
                // Leave the source untouched and drop the partial copy
                let _ = remove_any(dest);
                return Err(copy_err);
            }
            remove_any(src)
        }
        Err(e) => Err(e),
    }
}

impl FileActions for LocalFileActions {
    fn move_to_trash(
        &self,
        src: &Path,
        trash_root: &Path,
        roots: &[PathBuf],
    ) -> Result<PathBuf, FileOpError> {
        fs::create_dir_all(trash_root)
            .map_err(|e| FileOpError::TrashSetup(trash_root.to_path_buf(), e))?;

        let dest = trash_destination(src, trash_root, roots);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| FileOpError::TrashSetup(parent.to_path_buf(), e))?;
        }

        move_path(src, &dest).map_err(|source| FileOpError::Move {
            src: src.to_path_buf(),
            dest: dest.clone(),
            source,
        })?;
        Ok(dest)
    }

    fn remove_path(&self, src: &Path) -> Result<(), FileOpError> {
        remove_any(src).map_err(|e| FileOpError::Remove(src.to_path_buf(), e))
    }
}
