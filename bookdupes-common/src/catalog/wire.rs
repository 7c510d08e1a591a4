//! Raw JSON shapes returned by the catalog server
//!
//! The server is loose about where it puts things (item-level vs. media-level
//! tags, file paths on the file or inside its metadata, wrapped vs. bare
//! arrays). These records accept every observed shape and are converted into
//! the explicit models in [`crate::models`].

use serde::Deserialize;
use serde_json::Value;

use crate::models::{CatalogItem, Library, LibraryFile, Track};

/// `GET /api/libraries` answers either `{"libraries": [...]}` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum LibrariesResponse {
    Wrapped { libraries: Vec<RawLibrary> },
    Bare(Vec<RawLibrary>),
}

impl LibrariesResponse {
    pub fn into_libraries(self) -> Vec<Library> {
        let raw = match self {
            LibrariesResponse::Wrapped { libraries } => libraries,
            LibrariesResponse::Bare(libraries) => libraries,
        };
        raw.into_iter().map(Library::from).collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLibrary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default, rename = "type")]
    pub legacy_type: Option<String>,
}

impl From<RawLibrary> for Library {
    fn from(raw: RawLibrary) -> Self {
        Library {
            id: raw.id,
            name: raw.name,
            media_type: non_empty(raw.media_type).or_else(|| non_empty(raw.legacy_type)),
        }
    }
}

/// `GET /api/libraries/{id}/items` answers `libraryItems`, `results` or a bare array
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemsResponse {
    LibraryItems {
        #[serde(rename = "libraryItems")]
        library_items: Vec<RawItem>,
    },
    Results {
        results: Vec<RawItem>,
    },
    Bare(Vec<RawItem>),
}

impl ItemsResponse {
    /// Book items only, converted to explicit records
    pub fn into_book_items(self) -> Vec<CatalogItem> {
        let raw = match self {
            ItemsResponse::LibraryItems { library_items } => library_items,
            ItemsResponse::Results { results } => results,
            ItemsResponse::Bare(items) => items,
        };
        raw.into_iter()
            .filter(RawItem::is_book)
            .map(CatalogItem::from)
            .collect()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawItem {
    pub id: String,
    #[serde(default)]
    pub media_type: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub added_at: Option<Value>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub media: Option<RawMedia>,
    #[serde(default)]
    pub library_files: Option<Vec<RawLibraryFile>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMedia {
    #[serde(default, rename = "type")]
    pub media_type: Option<String>,
    #[serde(default)]
    pub metadata: Option<RawMetadata>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub tracks: Option<Vec<RawTrack>>,
    #[serde(default)]
    pub added_at: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub title_ignore_prefix: Option<String>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub series_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLibraryFile {
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub path: Option<Value>,
    #[serde(default)]
    pub rel_path: Option<Value>,
    #[serde(default)]
    pub metadata: Option<RawFileMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFileMetadata {
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub path: Option<Value>,
    #[serde(default)]
    pub rel_path: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTrack {
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl RawItem {
    pub fn is_book(&self) -> bool {
        let media_says_book = self
            .media
            .as_ref()
            .and_then(|m| m.media_type.as_deref())
            == Some("book");
        media_says_book || self.media_type.as_deref() == Some("book")
    }
}

impl From<RawItem> for CatalogItem {
    fn from(raw: RawItem) -> Self {
        let media = raw.media.unwrap_or_default();
        let metadata = media.metadata.unwrap_or_default();

        // Media-level tags win whenever the server sends them at all
        let tag_list = media.tags.or(raw.tags).unwrap_or_default();
        let mut tags: Vec<String> = Vec::with_capacity(tag_list.len());
        for tag in tag_list {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let added_at = raw
            .added_at
            .as_ref()
            .and_then(value_as_i64)
            .filter(|v| *v != 0)
            .or_else(|| media.added_at.as_ref().and_then(value_as_i64))
            .unwrap_or(0);

        CatalogItem {
            id: raw.id,
            title: metadata.title,
            title_ignore_prefix: metadata.title_ignore_prefix,
            author_name: metadata.author_name,
            series_name: metadata.series_name,
            tags,
            added_at,
            path: raw.path,
            library_files: raw
                .library_files
                .unwrap_or_default()
                .into_iter()
                .map(LibraryFile::from)
                .collect(),
            tracks: media
                .tracks
                .unwrap_or_default()
                .into_iter()
                .map(Track::from)
                .collect(),
        }
    }
}

impl From<RawLibraryFile> for LibraryFile {
    fn from(raw: RawLibraryFile) -> Self {
        let md = raw.metadata.unwrap_or_default();
        LibraryFile {
            file_type: raw.file_type,
            ext: non_empty(md.ext),
            mime_type: non_empty(raw.mime_type),
            path: string_value(raw.path.as_ref()).or_else(|| string_value(md.path.as_ref())),
            rel_path: string_value(raw.rel_path.as_ref())
                .or_else(|| string_value(md.rel_path.as_ref())),
        }
    }
}

impl From<RawTrack> for Track {
    fn from(raw: RawTrack) -> Self {
        Track {
            mime_type: non_empty(raw.mime_type),
            title: non_empty(raw.title),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Path fields are only trusted when they are non-empty JSON strings
fn string_value(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Timestamps arrive as integers, floats, or numeric strings depending on server version
fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_libraries_wrapped_and_bare() {
        let wrapped: LibrariesResponse = serde_json::from_value(json!({
            "libraries": [{"id": "l1", "name": "Audiobooks", "mediaType": "book"}]
        }))
        .unwrap();
        let libs = wrapped.into_libraries();
        assert_eq!(libs.len(), 1);
        assert!(libs[0].is_book_library());

        let bare: LibrariesResponse = serde_json::from_value(json!([
            {"id": "l2", "name": "Podcasts", "type": "podcast"}
        ]))
        .unwrap();
        let libs = bare.into_libraries();
        assert_eq!(libs[0].media_type.as_deref(), Some("podcast"));
    }

    #[test]
    fn test_item_conversion_prefers_media_tags() {
        let raw: RawItem = serde_json::from_value(json!({
            "id": "li_1",
            "mediaType": "book",
            "addedAt": 1700000000000i64,
            "tags": ["item-level"],
            "media": {
                "metadata": {"title": "Dune", "authorName": "Frank Herbert"},
                "tags": ["Duplicate", "Duplicate", "SciFi"]
            }
        }))
        .unwrap();
        let item = CatalogItem::from(raw);
        assert_eq!(item.tags, vec!["Duplicate", "SciFi"]);
        assert_eq!(item.added_at, 1_700_000_000_000);
        assert_eq!(item.author_name.as_deref(), Some("Frank Herbert"));
    }

    #[test]
    fn test_item_tags_fall_back_to_item_level() {
        let raw: RawItem = serde_json::from_value(json!({
            "id": "li_1",
            "tags": ["Favorites"],
            "media": {"metadata": {"title": "Dune"}}
        }))
        .unwrap();
        assert_eq!(CatalogItem::from(raw).tags, vec!["Favorites"]);
    }

    #[test]
    fn test_added_at_falls_back_to_media() {
        let raw: RawItem = serde_json::from_value(json!({
            "id": "li_1",
            "media": {"addedAt": "42"}
        }))
        .unwrap();
        assert_eq!(CatalogItem::from(raw).added_at, 42);
    }

    #[test]
    fn test_file_paths_from_metadata_block() {
        let raw: RawLibraryFile = serde_json::from_value(json!({
            "fileType": "audio",
            "mimeType": "audio/mpeg",
            "metadata": {"ext": ".mp3", "path": "/books/Dune/01.mp3", "relPath": "Dune/01.mp3"}
        }))
        .unwrap();
        let file = LibraryFile::from(raw);
        assert_eq!(file.path.as_deref(), Some("/books/Dune/01.mp3"));
        assert_eq!(file.rel_path.as_deref(), Some("Dune/01.mp3"));
        assert_eq!(file.ext.as_deref(), Some(".mp3"));
    }

    #[test]
    fn test_non_string_paths_are_ignored() {
        let raw: RawLibraryFile = serde_json::from_value(json!({
            "fileType": "audio",
            "path": 17
        }))
        .unwrap();
        assert_eq!(LibraryFile::from(raw).path, None);
    }

    #[test]
    fn test_items_response_filters_books() {
        let resp: ItemsResponse = serde_json::from_value(json!({
            "results": [
                {"id": "a", "mediaType": "book"},
                {"id": "b", "media": {"type": "book"}},
                {"id": "c", "mediaType": "podcast"}
            ]
        }))
        .unwrap();
        let ids: Vec<String> = resp.into_book_items().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_null_arrays_do_not_reject_listing() {
        let resp: ItemsResponse = serde_json::from_value(json!({
            "libraryItems": [
                {
                    "id": "a",
                    "mediaType": "book",
                    "libraryFiles": null,
                    "media": {"tracks": null, "tags": null, "metadata": {"title": "Dune"}}
                },
                {"id": "b", "mediaType": "book", "libraryFiles": []}
            ]
        }))
        .unwrap();
        let items = resp.into_book_items();
        assert_eq!(items.len(), 2);
        assert!(items[0].library_files.is_empty());
        assert!(items[0].tracks.is_empty());
        assert_eq!(items[0].title.as_deref(), Some("Dune"));
    }
}
