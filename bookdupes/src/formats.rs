//! Audio format classification
//!
//! The catalog reports formats in several inconsistent places. Candidate
//! tokens are gathered in priority order:
//! 1. Explicit extension of each audio file
//! 2. MIME subtype of each audio file (`audio/mpeg` → `mpeg`)
//! 3. Extension embedded in each audio file's `path` / `relPath`
//!
//! Items without audio files fall back to their tracks (MIME subtype, then an
//! extension in the track title).

use std::collections::HashMap;
use std::path::Path;

use bookdupes_common::CatalogItem;

/// Reported when no format can be derived at all
pub const UNKNOWN_FORMAT: &str = "unknown";

pub(crate) fn normalize_token(token: &str) -> Option<String> {
    let token = token.trim().trim_start_matches('.').to_lowercase();
    match token.as_str() {
        "" => None,
        "mp4" => Some("m4a".to_string()),
        _ => Some(token),
    }
}

fn mime_subtype(mime: &str) -> Option<&str> {
    let mime = mime.trim();
    if !mime.to_lowercase().contains("audio/") {
        return None;
    }
    mime.split_once('/').map(|(_, sub)| sub)
}

fn path_extension(path: &str) -> Option<&str> {
    Path::new(path).extension().and_then(|e| e.to_str())
}

fn raw_tokens(item: &CatalogItem) -> Vec<String> {
    let mut raw: Vec<String> = Vec::new();

    for file in item.audio_files() {
        if let Some(ext) = file.ext.as_deref() {
            raw.push(ext.to_string());
        }
        if let Some(sub) = file.mime_type.as_deref().and_then(mime_subtype) {
            raw.push(sub.to_string());
        }
        for path in [file.path.as_deref(), file.rel_path.as_deref()].into_iter().flatten() {
            if let Some(ext) = path_extension(path) {
                raw.push(ext.to_string());
            }
        }
    }

    if raw.is_empty() {
        for track in &item.tracks {
            if let Some(sub) = track.mime_type.as_deref().and_then(mime_subtype) {
                raw.push(sub.to_string());
            }
            if let Some(ext) = track.title.as_deref().and_then(path_extension) {
                raw.push(ext.to_string());
            }
        }
    }

    raw
}

/// Distinct normalized format tokens in first-seen order
pub fn item_formats(item: &CatalogItem) -> Vec<String> {
    let mut formats: Vec<String> = Vec::new();
    for token in raw_tokens(item).iter().filter_map(|t| normalize_token(t)) {
        if !formats.contains(&token) {
            formats.push(token);
        }
    }
    formats
}

/// Most frequent format token of an item, `unknown` when none is derivable
///
/// Ties go to the token seen first.
pub fn dominant_format(item: &CatalogItem) -> String {
    let formats = item_formats(item);
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in &formats {
        *counts.entry(token.as_str()).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for token in &formats {
        let count = counts[token.as_str()];
        if best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((token.as_str(), count));
        }
    }

    best.map(|(token, _)| token.to_string())
        .unwrap_or_else(|| UNKNOWN_FORMAT.to_string())
}
