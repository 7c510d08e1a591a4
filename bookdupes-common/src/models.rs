//! Catalog models
//!
//! Explicit records for what the catalog server reports. Every attribute the
//! server may omit is an `Option`; nothing is defaulted to an empty string
//! at this layer.

use serde::{Deserialize, Serialize};

/// A library as listed by the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub id: String,
    pub name: Option<String>,
    /// `mediaType` (newer servers) or `type` (older servers)
    pub media_type: Option<String>,
}

impl Library {
    /// Only book libraries are ever processed
    pub fn is_book_library(&self) -> bool {
        self.media_type.as_deref() == Some("book")
    }

    /// Name for display, falling back to the identifier
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// One file belonging to a catalog item
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryFile {
    /// `audio`, `image`, `ebook`, ... (compared case-insensitively)
    pub file_type: Option<String>,
    /// Extension reported by the server, with or without leading dot
    pub ext: Option<String>,
    pub mime_type: Option<String>,
    /// Absolute path as seen by the server
    pub path: Option<String>,
    /// Path relative to the library folder
    pub rel_path: Option<String>,
}

impl LibraryFile {
    pub fn is_audio(&self) -> bool {
        self.file_type
            .as_deref()
            .map(|t| t.eq_ignore_ascii_case("audio"))
            .unwrap_or(false)
    }

    /// Best available path: absolute first, relative second
    pub fn best_path(&self) -> Option<&str> {
        self.path
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| self.rel_path.as_deref().filter(|p| !p.is_empty()))
    }
}

/// One playable track of a book
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub mime_type: Option<String>,
    pub title: Option<String>,
}

/// Read-only snapshot of one catalog entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: String,
    pub title: Option<String>,
    pub title_ignore_prefix: Option<String>,
    pub author_name: Option<String>,
    pub series_name: Option<String>,
    /// Unique tag values; order carries no meaning
    pub tags: Vec<String>,
    /// Creation timestamp (milliseconds since epoch); 0 when unknown
    pub added_at: i64,
    /// Item-level folder path
    pub path: Option<String>,
    pub library_files: Vec<LibraryFile>,
    pub tracks: Vec<Track>,
}

impl CatalogItem {
    /// Title for display, `(no title)` when missing
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("(no title)")
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Full replacement tag set with `tag` added (no-op if already present)
    pub fn tags_with(&self, tag: &str) -> Vec<String> {
        let mut tags = self.tags.clone();
        if !self.has_tag(tag) {
            tags.push(tag.to_string());
        }
        tags
    }

    /// Full replacement tag set with every occurrence of `tag` removed
    pub fn tags_without(&self, tag: &str) -> Vec<String> {
        self.tags.iter().filter(|t| *t != tag).cloned().collect()
    }

    pub fn audio_files(&self) -> impl Iterator<Item = &LibraryFile> {
        self.library_files.iter().filter(|f| f.is_audio())
    }
}

/// One entry of a batch tag update: the complete new tag set for an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagUpdate {
    pub id: String,
    pub tags: Vec<String>,
}

impl TagUpdate {
    pub fn new(id: impl Into<String>, tags: Vec<String>) -> Self {
        Self {
            id: id.into(),
            tags,
        }
    }
}
