//! # bookdupes
//!
//! Finds duplicate books in an Audiobookshelf catalog, tags the extra copies
//! and optionally prunes them down to one copy in a preferred format.
//!
//! The engine is split into small pieces:
//! - [`normalize`] and [`grouping`]: which items are the same book
//! - [`keeper`] and [`formats`]: which copy survives
//! - [`safety`] and [`file_ops`]: what may be touched on disk
//! - [`tagging`] and [`prune`]: catalog and filesystem changes
//! - [`workflow`]: one full run, producing a [`report::RunReport`]

pub mod chooser;
pub mod file_ops;
pub mod formats;
pub mod grouping;
pub mod keeper;
pub mod libraries;
pub mod normalize;
pub mod prune;
pub mod report;
pub mod safety;
pub mod settings;
pub mod tagging;
pub mod workflow;

pub use chooser::{AutoChooser, FormatChooser, PromptChooser};
pub use file_ops::{FileActions, LocalFileActions};
pub use grouping::{GroupBy, GroupingPolicy};
pub use report::{render_summary, RunReport, SummaryOptions};
pub use settings::{FileAction, PruneSettings, RunSettings, SettingsOverrides};
pub use workflow::run;
