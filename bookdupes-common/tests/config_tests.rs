//! Config file discovery and parsing tests
//!
//! Note: Uses serial_test crate to prevent ENV variable race conditions.
//! Tests that manipulate BOOKDUPES_CONFIG are marked with #[serial].

use std::env;
use std::fs;

use bookdupes_common::config::{
    load_config, load_toml_config, resolve_config_path, TomlConfig, CONFIG_ENV_VAR,
};
use bookdupes_common::Error;
use serial_test::serial;
use tempfile::TempDir;

const SAMPLE: &str = r#"
base_url = "https://abs.example.com"
token = "abc123"
libraries = "Audiobooks, Kids*"
tag = "Dupe"
by = "title+author"
prune = true
assume_yes = true
delete_files = "trash"
trash_dir = "/var/tmp/bookdupes-trash"
allow_roots = ["/mnt/media/audiobooks"]
path_map = ["/audiobooks=/mnt/media/audiobooks"]
clean_tags_after_prune = false

[logging]
level = "debug"
"#;

#[test]
fn test_full_config_parses() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bookdupes.toml");
    fs::write(&path, SAMPLE).unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.base_url.as_deref(), Some("https://abs.example.com"));
    assert_eq!(
        config.libraries.unwrap().to_vec(),
        vec!["Audiobooks", "Kids*"]
    );
    assert_eq!(config.by.as_deref(), Some("title+author"));
    assert_eq!(config.prune, Some(true));
    assert_eq!(config.delete_files.as_deref(), Some("trash"));
    assert_eq!(config.clean_tags_after_prune, Some(false));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(
        config.path_map.unwrap().to_vec(),
        vec!["/audiobooks=/mnt/media/audiobooks"]
    );
}

#[test]
fn test_empty_config_uses_defaults() {
    let config: TomlConfig = toml::from_str("").unwrap();
    assert_eq!(config, TomlConfig::default());
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_malformed_config_is_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bookdupes.toml");
    fs::write(&path, "prune = maybe").unwrap();

    assert!(matches!(load_toml_config(&path), Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_explicit_path_wins_over_env() {
    let dir = TempDir::new().unwrap();
    let explicit = dir.path().join("explicit.toml");
    env::set_var(CONFIG_ENV_VAR, dir.path().join("env.toml"));

    let resolved = resolve_config_path(Some(&explicit));
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(resolved, Some(explicit));
}

#[test]
#[serial]
fn test_env_var_locates_config() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("from-env.toml");
    fs::write(&path, "tag = \"FromEnv\"\n").unwrap();
    env::set_var(CONFIG_ENV_VAR, &path);

    let result = load_config(None);
    env::remove_var(CONFIG_ENV_VAR);

    let (config, source) = result.unwrap();
    assert_eq!(config.tag.as_deref(), Some("FromEnv"));
    assert_eq!(source, Some(path));
}

#[test]
#[serial]
fn test_missing_env_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    env::set_var(CONFIG_ENV_VAR, dir.path().join("missing.toml"));

    let result = load_config(None);
    env::remove_var(CONFIG_ENV_VAR);

    let (config, source) = result.unwrap();
    assert_eq!(config, TomlConfig::default());
    assert!(source.is_none());
}

#[test]
#[serial]
fn test_missing_explicit_file_is_error() {
    let dir = TempDir::new().unwrap();
    let result = load_config(Some(&dir.path().join("nope.toml")));
    assert!(matches!(result, Err(Error::Config(_))));
}
