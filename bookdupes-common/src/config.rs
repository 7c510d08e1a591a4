//! Configuration file loading and path resolution
//!
//! Config file discovery priority:
//! 1. Explicit path (command-line `--config`)
//! 2. `BOOKDUPES_CONFIG` environment variable
//! 3. `./bookdupes.toml` in the working directory
//! 4. `<config dir>/bookdupes/bookdupes.toml` (e.g. `~/.config/bookdupes/bookdupes.toml`)
//!
//! A missing file is not an error: every option has a compiled default or is
//! supplied on the command line. A file that exists but does not parse is.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "BOOKDUPES_CONFIG";

/// File name searched for in the working and config directories
pub const CONFIG_FILE_NAME: &str = "bookdupes.toml";

/// A list option written either as a TOML array or as a comma-separated string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringList {
    List(Vec<String>),
    Csv(String),
}

impl StringList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            StringList::List(items) => items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            StringList::Csv(text) => split_csv(text),
        }
    }
}

/// Logging section of the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level (`error`, `warn`, `info`, `debug`, `trace`)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Contents of `bookdupes.toml`
///
/// Every key is optional; command-line flags override whatever is set here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub base_url: Option<String>,
    pub token: Option<String>,
    /// Library names or IDs (globs allowed, `ALL` for every book library)
    pub libraries: Option<StringList>,
    /// Explicit library IDs; take precedence over `libraries`
    pub library_id: Option<StringList>,
    /// Marker tag text
    pub tag: Option<String>,
    pub apply: Option<bool>,
    pub insecure: Option<bool>,
    pub case_sensitive: Option<bool>,
    /// `title`, `title+author` or `title+series`
    pub by: Option<String>,
    pub tag_all: Option<bool>,
    pub no_ignore_prefixes: Option<bool>,
    pub preferred_formats: Option<StringList>,
    pub prune: Option<bool>,
    pub assume_yes: Option<bool>,
    /// `off`, `trash` or `remove`
    pub delete_files: Option<String>,
    pub trash_dir: Option<PathBuf>,
    pub allow_roots: Option<StringList>,
    /// `src=dst` pairs, applied first match wins
    pub path_map: Option<StringList>,
    pub clean_tags_after_prune: Option<bool>,
    pub logging: LoggingConfig,
}

/// Split a comma-separated option, trimming blanks
pub fn split_csv(text: &str) -> Vec<String> {
    text.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse `src=dst` pairs; entries without `=` are ignored
pub fn parse_path_map(entries: &[String]) -> Vec<(String, String)> {
    entries
        .iter()
        .filter_map(|pair| {
            let (src, dst) = pair.split_once('=')?;
            Some((src.trim().to_string(), dst.trim().to_string()))
        })
        .collect()
}

/// Locate the config file to load, if any
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: Working directory
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return Some(local);
    }

    // Priority 4: Per-user config directory
    dirs::config_dir()
        .map(|d| d.join("bookdupes").join(CONFIG_FILE_NAME))
        .filter(|p| p.exists())
}

/// Parse a config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    let config: TomlConfig = toml::from_str(&content)?;
    debug!("Parsed config file {}", path.display());
    Ok(config)
}

/// Resolve and load the config file, falling back to defaults when none exists
///
/// Returns the loaded config and the path it came from.
pub fn load_config(explicit: Option<&Path>) -> Result<(TomlConfig, Option<PathBuf>)> {
    match resolve_config_path(explicit) {
        Some(path) if path.exists() => {
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok((config, Some(path)))
        }
        Some(path) => {
            if explicit.is_some() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            info!("Config file {} not found, using defaults", path.display());
            Ok((TomlConfig::default(), None))
        }
        None => {
            debug!("No config file found, using defaults");
            Ok((TomlConfig::default(), None))
        }
    }
}

/// OS-dependent default trash directory
pub fn default_trash_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        // %USERPROFILE%\.bookdupes\trash
        dirs::home_dir()
            .map(|d| d.join(".bookdupes").join("trash"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\bookdupes\\trash"))
    } else {
        // ~/.local/share/bookdupes/trash (Linux), ~/Library/Application Support/... (macOS)
        dirs::data_local_dir()
            .map(|d| d.join("bookdupes").join("trash"))
            .unwrap_or_else(|| PathBuf::from("./bookdupes_trash"))
    }
}
