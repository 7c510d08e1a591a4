//! bookdupes - command-line entry point
//!
//! Tags duplicate books in an Audiobookshelf server and, with `--prune`,
//! keeps one copy per book in the preferred format.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bookdupes::{
    render_summary, run, AutoChooser, FormatChooser, LocalFileActions, PromptChooser,
    RunSettings, SettingsOverrides, SummaryOptions,
};
use bookdupes_common::config::load_config;
use bookdupes_common::{AbsClient, Error};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for bookdupes
#[derive(Parser, Debug)]
#[command(name = "bookdupes")]
#[command(about = "Tag and prune duplicate books in Audiobookshelf")]
#[command(version)]
struct Args {
    /// Config file (default: ./bookdupes.toml, then ~/.config/bookdupes/bookdupes.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Server URL, e.g. https://abs.example.com
    #[arg(long, env = "ABS_BASE_URL")]
    base_url: Option<String>,

    /// API token
    #[arg(long, env = "ABS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Comma-separated library names, IDs or globs; ALL for every book library
    #[arg(long)]
    libraries: Option<String>,

    /// Explicit library ID (repeatable); wins over --libraries
    #[arg(long = "library-id")]
    library_id: Vec<String>,

    /// Marker tag for duplicate copies
    #[arg(long)]
    tag: Option<String>,

    /// Perform changes (default is a dry run)
    #[arg(long)]
    apply: bool,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Treat titles differing only in case as different books
    #[arg(long)]
    case_sensitive: bool,

    /// Grouping: title, title+author or title+series
    #[arg(long)]
    by: Option<String>,

    /// Tag every copy, including the earliest one
    #[arg(long)]
    tag_all: bool,

    /// Use the plain title instead of the "ignore prefix" title
    #[arg(long)]
    no_ignore_prefixes: bool,

    /// Comma-separated formats to keep, most preferred first (default m4b,mp3)
    #[arg(long)]
    preferred_formats: Option<String>,

    /// Remove all but one copy of each duplicate book
    #[arg(long)]
    prune: bool,

    /// Do not ask; keep the preferred format
    #[arg(long, short = 'y')]
    assume_yes: bool,

    /// What to do with pruned copies' folders: off, trash or remove
    #[arg(long)]
    delete_files: Option<String>,

    /// Trash directory for --delete-files trash
    #[arg(long)]
    trash_dir: Option<PathBuf>,

    /// Folder that file operations may touch (repeatable)
    #[arg(long = "allow-roots")]
    allow_roots: Vec<PathBuf>,

    /// Comma-separated src=dst pairs mapping server paths to local paths
    #[arg(long)]
    path_map: Option<String>,

    /// Remove the marker tag from the kept copy after pruning (default true)
    #[arg(long, value_name = "BOOL")]
    clean_tags_after_prune: Option<bool>,
}

fn flag(set: bool) -> Option<bool> {
    set.then_some(true)
}

impl Args {
    fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            base_url: self.base_url.clone(),
            token: self.token.clone(),
            libraries: self.libraries.clone(),
            library_ids: self.library_id.clone(),
            tag: self.tag.clone(),
            apply: flag(self.apply),
            insecure: flag(self.insecure),
            case_sensitive: flag(self.case_sensitive),
            by: self.by.clone(),
            tag_all: flag(self.tag_all),
            no_ignore_prefixes: flag(self.no_ignore_prefixes),
            preferred_formats: self.preferred_formats.clone(),
            prune: flag(self.prune),
            assume_yes: flag(self.assume_yes),
            delete_files: self.delete_files.clone(),
            trash_dir: self.trash_dir.clone(),
            allow_roots: self.allow_roots.clone(),
            path_map: self.path_map.clone(),
            clean_tags_after_prune: self.clean_tags_after_prune,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before logging starts so its level can seed the filter
    let (file_config, config_path) =
        load_config(args.config.as_deref()).context("Failed to load configuration")?;

    let level = file_config.logging.level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("bookdupes={level},bookdupes_common={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if let Some(path) = &config_path {
        info!("Loaded configuration from {}", path.display());
    }

    let settings = match RunSettings::resolve(args.overrides(), &file_config) {
        Ok(settings) => settings,
        Err(Error::Config(message)) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Invalid settings"),
    };

    let client = AbsClient::builder()
        .base_url(&settings.base_url)
        .token(&settings.token)
        .insecure(settings.insecure)
        .build()
        .context("Failed to create catalog client")?;

    let mut chooser: Box<dyn FormatChooser> = if settings.pruning.assume_yes {
        Box::new(AutoChooser)
    } else {
        Box::new(PromptChooser::stdio())
    };

    let report = run(&client, &LocalFileActions, &settings, chooser.as_mut())
        .await
        .context("Failed to fetch libraries")?;

    if report.stats.libraries_selected == 0 {
        println!("No matching book libraries found. Nothing to do.");
        return Ok(());
    }

    let options = SummaryOptions {
        apply: settings.apply,
        prune: settings.prune,
        tag: settings.marker_tag.clone(),
    };
    print!("{}", render_summary(&report, &options));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_roots_keep_commas() {
        let args = Args::try_parse_from([
            "bookdupes",
            "--allow-roots",
            "/media/Books, Vol. 1",
            "--allow-roots",
            "/media/more",
        ])
        .unwrap();
        assert_eq!(
            args.allow_roots,
            vec![PathBuf::from("/media/Books, Vol. 1"), PathBuf::from("/media/more")]
        );
    }
}
