
use anyhow::ensure;
use clap::Args;
use log::info;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::core::{check_optional_filename, check_required_filename, resolve_db_dir, AFTER_HELP, FULL_VERSION};
use crate::parsing::mutation_panel::panel_path;

#[derive(Args, Clone, Default, Serialize)]
#[clap(author, about,
    after_help = &**AFTER_HELP
)]
pub struct CollateSettings {
    #[clap(default_value = "")]
    #[clap(hide = true)]
    host_profiler_version: String,

    /// Output prefix; writes <PREFIX>.variants.csv and <PREFIX>.coverage.csv
    #[clap(required = true)]
    #[clap(long = "out")]
    #[clap(value_name = "PREFIX")]
    #[clap(help_heading = Some("Input/Output"))]
    pub out_prefix: PathBuf,

    /// File listing one sample ID per line [default: discover all reports in --dir]
    #[clap(long = "samples")]
    #[clap(value_name = "FILE")]
    #[clap(help_heading = Some("Input/Output"))]
    pub samples_file: Option<PathBuf>,

    /// Folder containing the per-sample reports and alignments
    #[clap(long = "dir")]
    #[clap(value_name = "DIR")]
    #[clap(default_value = ".")]
    #[clap(help_heading = Some("Input/Output"))]
    pub dir: PathBuf,

    /// Suffix of the per-sample report files
    #[clap(long = "suffix")]
    #[clap(value_name = "SUFFIX")]
    #[clap(default_value = ".results.json")]
    #[clap(help_heading = Some("Input/Output"))]
    pub suffix: String,

    /// Optional output debug folder
    #[clap(long = "output-debug")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Input/Output"))]
    pub debug_folder: Option<PathBuf>,

    /// Mutation panel name
    #[clap(required = true)]
    #[clap(long = "db")]
    #[clap(value_name = "NAME")]
    #[clap(help_heading = Some("Mutation panel"))]
    pub db_name: String,

    /// Mutation panel folder [default: <prefix>/share/host-profiler]
    #[clap(long = "db-dir")]
    #[clap(alias = "db_dir")]
    #[clap(value_name = "DIR")]
    #[clap(help_heading = Some("Mutation panel"))]
    pub db_dir: Option<PathBuf>,

    /// Minimum depth for an unobserved mutation to be called reference
    #[clap(long = "min-depth")]
    #[clap(value_name = "DEPTH")]
    #[clap(default_value = "10")]
    #[clap(help_heading = Some("Depth lookup"))]
    pub min_depth: u64,

    /// Suffix of the per-sample alignment files
    #[clap(long = "bam-suffix")]
    #[clap(value_name = "SUFFIX")]
    #[clap(default_value = ".bam")]
    #[clap(help_heading = Some("Depth lookup"))]
    pub bam_suffix: String,

    /// Executable used for depth lookups
    #[clap(long = "samtools")]
    #[clap(value_name = "EXE")]
    #[clap(default_value = "samtools")]
    #[clap(help_heading = Some("Depth lookup"))]
    pub samtools: PathBuf,

    /// Number of threads to use in the depth lookup step
    #[clap(long = "threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[clap(help_heading = Some("Depth lookup"))]
    pub threads: usize,

    /// Enable verbose output.
    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = clap::ArgAction::Count)]
    pub verbosity: u8,
}

pub fn check_collate_settings(mut settings: CollateSettings) -> anyhow::Result<CollateSettings> {
    // hard code the version in
    settings.host_profiler_version = FULL_VERSION.clone();
    info!("Host-Profiler version: {:?}", &settings.host_profiler_version);
    info!("Sub-command: collate");
    info!("Inputs:");

    check_required_filename(&settings.dir, "Report folder")?;
    info!("\tReport folder: {:?}", &settings.dir);
    info!("\tReport suffix: {:?}", &settings.suffix);
    check_optional_filename(settings.samples_file.as_deref(), "Sample list")?;
    if let Some(samples_fn) = settings.samples_file.as_deref() {
        info!("\tSample list: {samples_fn:?}");
    } else {
        info!("\tSample list: discovered from report folder");
    }

    // panel lookup
    let db_dir = resolve_db_dir(settings.db_dir.take())?;
    check_required_filename(&panel_path(&db_dir, &settings.db_name), "Mutation panel")?;
    info!("\tPanel: {:?} in {db_dir:?}", &settings.db_name);
    settings.db_dir = Some(db_dir);

    // outputs
    info!("Outputs:");
    info!("\tPrefix: {:?}", &settings.out_prefix);
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("\tDebug folder: {debug_folder:?}");
    }

    info!("Depth parameters:");
    ensure!(!settings.bam_suffix.is_empty(), "--bam-suffix must not be empty");
    info!("\tMinimum depth: {}", settings.min_depth);
    info!("\tAlignment suffix: {:?}", &settings.bam_suffix);
    info!("\tDepth executable: {:?}", &settings.samtools);

    // 0 is just a sentinel for a single thread
    if settings.threads == 0 {
        settings.threads = 1;
    }
    info!("Processing threads: {}", settings.threads);

    Ok(settings)
}
