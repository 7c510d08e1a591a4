//! Resolved run settings
//!
//! Values come from the command line first, then the config file, then
//! compiled defaults. Environment variables are folded into the command-line
//! layer by clap before they reach this module.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use bookdupes_common::config::{default_trash_dir, parse_path_map, split_csv, TomlConfig};
use bookdupes_common::{Error, Result};
use tracing::warn;

use crate::formats::normalize_token;
use crate::grouping::{GroupBy, GroupingPolicy};

pub const DEFAULT_TAG: &str = "Duplicate";
pub const DEFAULT_PREFERRED_FORMATS: [&str; 2] = ["m4b", "mp3"];

/// What happens to a pruned copy's folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileAction {
    #[default]
    Off,
    Trash,
    Remove,
}

impl FileAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileAction::Off => "off",
            FileAction::Trash => "trash",
            FileAction::Remove => "remove",
        }
    }

    /// Lenient parse: anything unrecognised is `Off`
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!("Unknown delete_files value '{}', using 'off'", value);
            FileAction::Off
        })
    }
}

impl fmt::Display for FileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "off" => Ok(FileAction::Off),
            "trash" => Ok(FileAction::Trash),
            "remove" => Ok(FileAction::Remove),
            other => Err(format!("unknown file action '{}'", other)),
        }
    }
}

/// Prune-phase options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneSettings {
    /// Lowercase format tokens, most preferred first
    pub preferred_formats: Vec<String>,
    /// Non-interactive: take default formats and reconcile tags
    pub assume_yes: bool,
    pub file_action: FileAction,
    pub trash_dir: PathBuf,
    pub allow_roots: Vec<PathBuf>,
    pub path_map: Vec<(String, String)>,
    pub clean_tags_after_prune: bool,
}

impl Default for PruneSettings {
    fn default() -> Self {
        Self {
            preferred_formats: DEFAULT_PREFERRED_FORMATS.iter().map(|f| f.to_string()).collect(),
            assume_yes: false,
            file_action: FileAction::Off,
            trash_dir: default_trash_dir(),
            allow_roots: Vec::new(),
            path_map: Vec::new(),
            clean_tags_after_prune: true,
        }
    }
}

impl PruneSettings {
    /// File action actually used: nothing is touched on disk without allow-roots
    pub fn effective_file_action(&self) -> FileAction {
        if self.allow_roots.is_empty() {
            FileAction::Off
        } else {
            self.file_action
        }
    }
}

/// Command-line layer; `None`/empty means "not given"
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub libraries: Option<String>,
    pub library_ids: Vec<String>,
    pub tag: Option<String>,
    pub apply: Option<bool>,
    pub insecure: Option<bool>,
    pub case_sensitive: Option<bool>,
    pub by: Option<String>,
    pub tag_all: Option<bool>,
    pub no_ignore_prefixes: Option<bool>,
    pub preferred_formats: Option<String>,
    pub prune: Option<bool>,
    pub assume_yes: Option<bool>,
    pub delete_files: Option<String>,
    pub trash_dir: Option<PathBuf>,
    pub allow_roots: Vec<PathBuf>,
    pub path_map: Option<String>,
    pub clean_tags_after_prune: Option<bool>,
}

/// Everything one run needs, fully resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub base_url: String,
    pub token: String,
    pub insecure: bool,
    /// Library names, IDs or globs; empty or `ALL` selects every book library
    pub libraries: Vec<String>,
    /// Explicit library IDs; win over `libraries`
    pub library_ids: Vec<String>,
    pub marker_tag: String,
    pub apply: bool,
    pub grouping: GroupingPolicy,
    pub tag_all: bool,
    pub prune: bool,
    pub pruning: PruneSettings,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn format_list(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in values.iter().filter_map(|v| normalize_token(v)) {
        if !out.contains(&token) {
            out.push(token);
        }
    }
    out
}

impl RunSettings {
    /// Merge the command line over the config file
    ///
    /// Fails with [`Error::Config`] when the server URL or the token is
    /// missing, or the grouping policy is not recognised.
    pub fn resolve(cli: SettingsOverrides, file: &TomlConfig) -> Result<Self> {
        let base_url = non_empty(cli.base_url).or_else(|| non_empty(file.base_url.clone()));
        let token = non_empty(cli.token).or_else(|| non_empty(file.token.clone()));

        let mut missing = Vec::new();
        if base_url.is_none() {
            missing.push("--base-url (or base_url in config)");
        }
        if token.is_none() {
            missing.push("--token / $ABS_TOKEN (or token in config)");
        }
        let (Some(base_url), Some(token)) = (base_url, token) else {
            return Err(Error::Config(format!(
                "Missing required option(s): {}",
                missing.join(", ")
            )));
        };

        let libraries = match cli.libraries {
            Some(csv) => split_csv(&csv),
            None => file.libraries.as_ref().map(|l| l.to_vec()).unwrap_or_default(),
        };
        let library_ids = if cli.library_ids.is_empty() {
            file.library_id.as_ref().map(|l| l.to_vec()).unwrap_or_default()
        } else {
            cli.library_ids
        };

        let by = match non_empty(cli.by).or_else(|| non_empty(file.by.clone())) {
            Some(text) => text.parse::<GroupBy>().map_err(Error::Config)?,
            None => GroupBy::default(),
        };
        let grouping = GroupingPolicy {
            by,
            use_ignore_prefix_title: !cli
                .no_ignore_prefixes
                .or(file.no_ignore_prefixes)
                .unwrap_or(false),
            case_sensitive: cli.case_sensitive.or(file.case_sensitive).unwrap_or(false),
        };

        let preferred = match cli.preferred_formats {
            Some(csv) => split_csv(&csv),
            None => file
                .preferred_formats
                .as_ref()
                .map(|l| l.to_vec())
                .unwrap_or_default(),
        };
        let mut preferred_formats = format_list(preferred);
        if preferred_formats.is_empty() {
            preferred_formats = DEFAULT_PREFERRED_FORMATS.iter().map(|f| f.to_string()).collect();
        }

        let file_action = cli
            .delete_files
            .or_else(|| file.delete_files.clone())
            .map(|v| FileAction::parse_lenient(&v))
            .unwrap_or_default();

        let allow_roots = if cli.allow_roots.is_empty() {
            file.allow_roots
                .as_ref()
                .map(|l| l.to_vec().into_iter().map(PathBuf::from).collect::<Vec<_>>())
                .unwrap_or_default()
        } else {
            cli.allow_roots
        };

        let path_map = match cli.path_map {
            Some(csv) => parse_path_map(&split_csv(&csv)),
            None => file
                .path_map
                .as_ref()
                .map(|l| parse_path_map(&l.to_vec()))
                .unwrap_or_default(),
        };

        let pruning = PruneSettings {
            preferred_formats,
            assume_yes: cli.assume_yes.or(file.assume_yes).unwrap_or(false),
            file_action,
            trash_dir: cli
                .trash_dir
                .or_else(|| file.trash_dir.clone())
                .unwrap_or_else(default_trash_dir),
            allow_roots,
            path_map,
            clean_tags_after_prune: cli
                .clean_tags_after_prune
                .or(file.clean_tags_after_prune)
                .unwrap_or(true),
        };

        Ok(Self {
            base_url,
            token,
            insecure: cli.insecure.or(file.insecure).unwrap_or(false),
            libraries,
            library_ids,
            marker_tag: non_empty(cli.tag)
                .or_else(|| non_empty(file.tag.clone()))
                .unwrap_or_else(|| DEFAULT_TAG.to_string()),
            apply: cli.apply.or(file.apply).unwrap_or(false),
            grouping,
            tag_all: cli.tag_all.or(file.tag_all).unwrap_or(false),
            prune: cli.prune.or(file.prune).unwrap_or(false),
            pruning,
        })
    }
}
