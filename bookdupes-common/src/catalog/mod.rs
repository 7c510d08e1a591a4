//! Remote catalog access
//!
//! [`CatalogApi`] is the seam between the duplicate engine and the server.
//! [`AbsClient`] talks HTTP; tests substitute an in-memory implementation.

mod client;
pub mod wire;

pub use client::{AbsClient, AbsClientBuilder, BATCH_SIZE, BATCH_PACING_MS};

use async_trait::async_trait;

use crate::models::{CatalogItem, Library, TagUpdate};
use crate::Result;

/// Result of a catalog deletion that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Server removed the entry
    Deleted,
    /// Entry was already gone (404); counts as success
    AlreadyAbsent,
}

/// Operations the duplicate engine needs from the catalog
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// All libraries visible to the token
    async fn list_libraries(&self) -> Result<Vec<Library>>;

    /// Book items of one library, fully expanded
    async fn list_items(&self, library_id: &str) -> Result<Vec<CatalogItem>>;

    /// Replace the tag sets of the given items
    ///
    /// Returns the server-reported number of updated items, which is advisory.
    async fn batch_update_tags(&self, updates: &[TagUpdate]) -> Result<u64>;

    /// Delete one item; "not found" is reported as [`DeleteOutcome::AlreadyAbsent`]
    async fn delete_item(&self, item_id: &str) -> Result<DeleteOutcome>;
}
