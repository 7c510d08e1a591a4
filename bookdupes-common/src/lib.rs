//! # bookdupes common library
//!
//! Shared code for the bookdupes tools including:
//! - Catalog item models (explicit records built from the server's JSON)
//! - Catalog API trait and the HTTP client implementing it
//! - Configuration file loading
//! - Error types
//! - Timestamp helpers

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod time;

pub use catalog::{AbsClient, CatalogApi, DeleteOutcome};
pub use error::{Error, Result};
pub use models::{CatalogItem, Library, LibraryFile, TagUpdate, Track};
