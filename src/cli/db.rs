
use clap::{Args, Subcommand};
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_required_filename, resolve_db_dir, AFTER_HELP, FULL_VERSION};

#[derive(Subcommand)]
pub enum DbCommands {
    /// List the installed mutation panels
    List(DbListSettings),
    /// Install a mutation panel archive
    Install(DbInstallSettings)
}

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct DbListSettings {
    /// Mutation panel folder [default: <prefix>/share/host-profiler]
    #[clap(long = "db-dir")]
    #[clap(alias = "db_dir")]
    #[clap(value_name = "DIR")]
    pub db_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct DbInstallSettings {
    /// Panel archive (.tar.gz, .tgz, or .zip)
    #[clap(required = true)]
    #[clap(long = "archive")]
    #[clap(value_name = "FILE")]
    pub archive: PathBuf,

    /// Mutation panel folder [default: <prefix>/share/host-profiler]
    #[clap(long = "db-dir")]
    #[clap(alias = "db_dir")]
    #[clap(value_name = "DIR")]
    pub db_dir: Option<PathBuf>,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_db_list_settings(mut settings: DbListSettings) -> anyhow::Result<DbListSettings> {
    info!("Host-Profiler version: {:?}", &*FULL_VERSION);
    info!("Sub-command: db list");

    let db_dir = resolve_db_dir(settings.db_dir.take())?;
    check_required_filename(&db_dir, "Database folder")?;
    info!("\tDatabase folder: {db_dir:?}");
    settings.db_dir = Some(db_dir);
    Ok(settings)
}

pub fn check_db_install_settings(mut settings: DbInstallSettings) -> anyhow::Result<DbInstallSettings> {
    info!("Host-Profiler version: {:?}", &*FULL_VERSION);
    info!("Sub-command: db install");

    check_required_filename(&settings.archive, "Panel archive")?;
    info!("\tArchive: {:?}", &settings.archive);

    // the folder is created on install, so it does not need to exist yet
    let db_dir = resolve_db_dir(settings.db_dir.take())?;
    info!("\tDatabase folder: {db_dir:?}");
    settings.db_dir = Some(db_dir);
    Ok(settings)
}
