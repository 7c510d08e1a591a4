//! In-memory catalog and file actions for tests

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use bookdupes::file_ops::{FileActions, FileOpError};
use bookdupes_common::{
    CatalogApi, CatalogItem, DeleteOutcome, Error, Library, Result, TagUpdate,
};

/// One request the engine sent to the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    ListLibraries,
    ListItems(String),
    UpdateTags(Vec<TagUpdate>),
    Delete(String),
}

#[derive(Default)]
pub struct FakeCatalog {
    libraries: Vec<Library>,
    items: HashMap<String, Vec<CatalogItem>>,
    failing_libraries: HashSet<String>,
    fail_library_listing: bool,
    absent_items: HashSet<String>,
    failing_deletes: HashSet<String>,
    fail_tag_updates: bool,
    calls: Mutex<Vec<CatalogCall>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(mut self, library: Library, items: Vec<CatalogItem>) -> Self {
        self.items.insert(library.id.clone(), items);
        self.libraries.push(library);
        self
    }

    /// Listing this library's items returns a server error
    pub fn failing_items(mut self, library: Library) -> Self {
        self.failing_libraries.insert(library.id.clone());
        self.libraries.push(library);
        self
    }

    pub fn failing_library_listing(mut self) -> Self {
        self.fail_library_listing = true;
        self
    }

    /// Batch tag updates answer a server error
    pub fn failing_tag_updates(mut self) -> Self {
        self.fail_tag_updates = true;
        self
    }

    /// Deleting this item answers 404
    pub fn absent(mut self, item_id: &str) -> Self {
        self.absent_items.insert(item_id.to_string());
        self
    }

    /// Deleting this item answers 500
    pub fn failing_delete(mut self, item_id: &str) -> Self {
        self.failing_deletes.insert(item_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                CatalogCall::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn tag_updates(&self) -> Vec<Vec<TagUpdate>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                CatalogCall::UpdateTags(updates) => Some(updates),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: CatalogCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn list_libraries(&self) -> Result<Vec<Library>> {
        self.record(CatalogCall::ListLibraries);
        if self.fail_library_listing {
            return Err(Error::Api {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(self.libraries.clone())
    }

    async fn list_items(&self, library_id: &str) -> Result<Vec<CatalogItem>> {
        self.record(CatalogCall::ListItems(library_id.to_string()));
        if self.failing_libraries.contains(library_id) {
            return Err(Error::Api {
                status: 500,
                message: "boom".to_string(),
            });
        }
        self.items
            .get(library_id)
            .cloned()
            .ok_or_else(|| Error::Api {
                status: 404,
                message: format!("no library {}", library_id),
            })
    }

    async fn batch_update_tags(&self, updates: &[TagUpdate]) -> Result<u64> {
        self.record(CatalogCall::UpdateTags(updates.to_vec()));
        if self.fail_tag_updates {
            return Err(Error::Api {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        Ok(updates.len() as u64)
    }

    async fn delete_item(&self, item_id: &str) -> Result<DeleteOutcome> {
        self.record(CatalogCall::Delete(item_id.to_string()));
        if self.failing_deletes.contains(item_id) {
            return Err(Error::Api {
                status: 500,
                message: "delete failed".to_string(),
            });
        }
        if self.absent_items.contains(item_id) {
            return Ok(DeleteOutcome::AlreadyAbsent);
        }
        Ok(DeleteOutcome::Deleted)
    }
}

/// One request the engine sent to the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileCall {
    Trash(PathBuf),
    Remove(PathBuf),
}

/// File actions that never touch the disk; paths marked failing answer an I/O error
#[derive(Default)]
pub struct RecordingFiles {
    failing: HashSet<PathBuf>,
    calls: Mutex<Vec<FileCall>>,
}

impl RecordingFiles {
    pub fn failing(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.insert(path.into());
        self
    }

    pub fn calls(&self) -> Vec<FileCall> {
        self.calls.lock().unwrap().clone()
    }

    fn denied(&self, path: &Path) -> Option<std::io::Error> {
        self.failing.contains(path).then(|| {
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only filesystem")
        })
    }
}

impl FileActions for RecordingFiles {
    fn move_to_trash(
        &self,
        src: &Path,
        trash_root: &Path,
        _roots: &[PathBuf],
    ) -> std::result::Result<PathBuf, FileOpError> {
        self.calls.lock().unwrap().push(FileCall::Trash(src.to_path_buf()));
        if let Some(source) = self.denied(src) {
            return Err(FileOpError::Move {
                src: src.to_path_buf(),
                dest: trash_root.to_path_buf(),
                source,
            });
        }
        Ok(trash_root.join(src.file_name().unwrap_or_default()))
    }

    fn remove_path(&self, src: &Path) -> std::result::Result<(), FileOpError> {
        self.calls.lock().unwrap().push(FileCall::Remove(src.to_path_buf()));
        match self.denied(src) {
            Some(e) => Err(FileOpError::Remove(src.to_path_buf(), e)),
            None => Ok(()),
        }
    }
}
