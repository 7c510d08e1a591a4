//! Test helpers for bookdupes integration tests
//!
//! - FakeCatalog: in-memory catalog recording every call
//! - RecordingFiles: file actions that only record what they were asked
//! - Builders for catalog items and run settings

#![allow(dead_code)]

pub mod fake_catalog;

pub use fake_catalog::{CatalogCall, FakeCatalog, FileCall, RecordingFiles};

use std::path::PathBuf;

use bookdupes::grouping::GroupingPolicy;
use bookdupes::settings::{FileAction, PruneSettings, RunSettings};
use bookdupes_common::{CatalogItem, Library, LibraryFile};

pub fn book_library(id: &str, name: &str) -> Library {
    Library {
        id: id.to_string(),
        name: Some(name.to_string()),
        media_type: Some("book".to_string()),
    }
}

/// One copy of a book with a single audio file
pub fn copy(id: &str, title: &str, ext: &str, added_at: i64, folder: &str) -> CatalogItem {
    CatalogItem {
        id: id.to_string(),
        title: Some(title.to_string()),
        author_name: Some("Frank Herbert".to_string()),
        added_at,
        path: Some(folder.to_string()),
        library_files: vec![LibraryFile {
            file_type: Some("audio".to_string()),
            ext: Some(ext.to_string()),
            path: Some(format!("{}/{}.{}", folder, title, ext)),
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// Settings for a non-interactive run against a fake server
pub fn settings(apply: bool, prune: bool) -> RunSettings {
    RunSettings {
        base_url: "http://abs.test".to_string(),
        token: "token".to_string(),
        insecure: false,
        libraries: Vec::new(),
        library_ids: Vec::new(),
        marker_tag: "Duplicate".to_string(),
        apply,
        grouping: GroupingPolicy::default(),
        tag_all: false,
        prune,
        pruning: PruneSettings {
            preferred_formats: vec!["m4b".to_string(), "mp3".to_string()],
            assume_yes: true,
            file_action: FileAction::Off,
            trash_dir: PathBuf::from("/tmp/bookdupes-test-trash"),
            allow_roots: Vec::new(),
            path_map: Vec::new(),
            clean_tags_after_prune: true,
        },
    }
}
