
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use chrono::Datelike;
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};

use crate::cli::collate::CollateSettings;
use crate::cli::db::DbCommands;

lazy_static! {
    /// Stores the full version string we plan to use, which is generated in build.rs
    /// # Examples
    /// * `0.1.0-6bb9635-dirty` - while on a dirty branch
    /// * `0.1.0-6bb9635` - with a fresh commit
    pub static ref FULL_VERSION: String = format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("VERGEN_GIT_DESCRIBE"));

    /// Shared after help string
    pub static ref AFTER_HELP: String = format!("Copyright (C) 2023-{}     Host-Profiler contributors
This program comes with ABSOLUTELY NO WARRANTY; it is intended for
Research Use Only and not for use in diagnostic procedures.", chrono::Utc::now().year());
}

/// Folder name of the panel databases under the install prefix
pub const SOFTWARE_NAME: &str = "host-profiler";

#[derive(Parser)]
#[clap(author,
    version = &**FULL_VERSION,
    about,
    after_help = &**AFTER_HELP)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands
}

/// Host-Profiler, profiles host samples against a mutation panel.
/// Select a subcommand to see more usage information:
#[derive(Subcommand)]
pub enum Commands {
    /// Collate results from multiple samples into cohort tables
    Collate(Box<CollateSettings>),
    /// Manage mutation panel databases
    #[command(subcommand)]
    Db(DbCommands)
}

pub fn get_cli() -> Cli {
    Cli::parse()
}

/// Checks if a file exists and will otherwise exit
/// # Arguments
/// * `filename` - the file path to check for
/// * `label` - the label to use for error messages
pub fn check_required_filename(filename: &Path, label: &str) -> anyhow::Result<()> {
    if !filename.exists() {
        bail!("{} does not exist: \"{}\"", label, filename.display());
    }
    Ok(())
}

/// Checks an optional file path, passing if it was not specified
/// # Arguments
/// * `opt_filename` - the optional file path to check for
/// * `label` - the label to use for error messages
pub fn check_optional_filename(opt_filename: Option<&Path>, label: &str) -> anyhow::Result<()> {
    if let Some(filename) = opt_filename {
        check_required_filename(filename, label)?;
    }
    Ok(())
}

/// Default panel database folder, `<prefix>/share/host-profiler`, where the executable lives in `<prefix>/bin`
/// # Errors
/// * if the executable path cannot be determined
pub fn default_db_dir() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe()
        .context("Error while locating the executable:")?;
    let prefix = exe.parent()
        .and_then(|bin| bin.parent())
        .unwrap_or_else(|| Path::new("."));
    Ok(prefix.join("share").join(SOFTWARE_NAME))
}

/// Resolves a user-provided database folder, falling back to the default
pub fn resolve_db_dir(db_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match db_dir {
        Some(d) => Ok(d),
        None => default_db_dir()
    }
}
