
use log::{LevelFilter, error, info, warn};
use std::path::PathBuf;
use std::time::Instant;

use host_profiler::cli::collate::{CollateSettings, check_collate_settings};
use host_profiler::cli::core::{Commands, get_cli};
use host_profiler::cli::db::{DbCommands, DbInstallSettings, DbListSettings, check_db_install_settings, check_db_list_settings};
use host_profiler::collate::{CollateConfigBuilder, run_collation};
use host_profiler::data_types::collate_error::exit_code_for;
use host_profiler::database::{install_database, list_databases};
use host_profiler::depth_lookup::SamtoolsDepth;
use host_profiler::reconciler::ReconcileConfigBuilder;
use host_profiler::util::json_io::save_json;

/// Sets up logging for a subcommand
fn init_logging(verbosity: u8) {
    let filter_level: LevelFilter = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace
    };
    env_logger::builder()
        .format_timestamp_millis()
        .filter_level(filter_level)
        .init();
}

/// Pulls out the resolved database folder, which the settings checks always fill in
fn resolved_db_dir(db_dir: Option<PathBuf>) -> PathBuf {
    match db_dir {
        Some(d) => d,
        None => {
            error!("Database folder was not resolved");
            std::process::exit(exitcode::SOFTWARE);
        }
    }
}

fn run_collate(settings: CollateSettings) {
    // start the timer
    let start_time = Instant::now();

    // set up logging before we check the other settings
    init_logging(settings.verbosity);

    let settings = match check_collate_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    // create a debug folder if specified
    if let Some(debug_folder) = settings.debug_folder.as_ref() {
        info!("Creating debug folder at {debug_folder:?}...");
        match std::fs::create_dir_all(debug_folder) {
            Ok(()) => {},
            Err(e) => {
                error!("Error while creating debug folder: {e}");
                std::process::exit(exitcode::IOERR);
            }
        }

        // save the CLI options
        let cli_json = debug_folder.join("cli_settings.json");
        info!("Saving CLI options to {cli_json:?}...");
        if let Err(e) = save_json(&settings, &cli_json) {
            error!("Error while saving CLI options: {e}");
            std::process::exit(exitcode::IOERR);
        }
    }

    let reconcile_config = match ReconcileConfigBuilder::default()
        .min_depth(settings.min_depth)
        .build() {
        Ok(rc) => rc,
        Err(e) => {
            error!("Error while building reconcile config: {e}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    let db_dir = resolved_db_dir(settings.db_dir.clone());
    let collate_config = match CollateConfigBuilder::default()
        .samples_file(settings.samples_file.clone())
        .report_dir(settings.dir.clone())
        .report_suffix(settings.suffix.clone())
        .db_dir(db_dir)
        .db_name(settings.db_name.clone())
        .out_prefix(settings.out_prefix.clone())
        .reconcile(reconcile_config)
        .threads(settings.threads)
        .build() {
        Ok(cc) => cc,
        Err(e) => {
            error!("Error while building collate config: {e}");
            std::process::exit(exitcode::SOFTWARE);
        }
    };

    let depth_source = SamtoolsDepth::new(
        settings.samtools.clone(),
        settings.dir.clone(),
        settings.bam_suffix.clone()
    );

    let collation = match run_collation(&collate_config, &depth_source) {
        Ok(c) => c,
        Err(e) => {
            error!("Error while collating samples: {e:#}");
            std::process::exit(exit_code_for(&e));
        }
    };

    if !collation.skipped_samples().is_empty() {
        warn!("Skipped {} samples without a report: {:?}", collation.skipped_samples().len(), collation.skipped_samples());
    }
    info!(
        "Collated {} samples into {} variant rows and {} coverage rows.",
        collation.loaded_samples().len(), collation.variants().len(), collation.coverage().len()
    );
    info!("Outputs written to {:?} and {:?}", collate_config.variants_filename(), collate_config.coverage_filename());
    info!("Time elapsed: {} seconds", start_time.elapsed().as_secs_f64());
}

fn run_db_list(settings: DbListSettings) {
    init_logging(settings.verbosity);

    let settings = match check_db_list_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let db_dir = resolved_db_dir(settings.db_dir);
    let panels = match list_databases(&db_dir) {
        Ok(p) => p,
        Err(e) => {
            error!("Error while listing databases: {e:#}");
            std::process::exit(exitcode::IOERR);
        }
    };
    if panels.is_empty() {
        warn!("No mutation panels found in {db_dir:?}");
    }
    for panel in panels.iter() {
        println!("{}", panel.listing_line());
    }
}

fn run_db_install(settings: DbInstallSettings) {
    init_logging(settings.verbosity);

    let settings = match check_db_install_settings(settings) {
        Ok(s) => s,
        Err(e) => {
            error!("Error while verifying settings: {e:#}");
            std::process::exit(exitcode::CONFIG);
        }
    };

    let db_dir = resolved_db_dir(settings.db_dir);
    if let Err(e) = install_database(&settings.archive, &db_dir) {
        error!("Error while installing database: {e:#}");
        std::process::exit(exit_code_for(&e));
    }
    info!("Installed {:?} into {db_dir:?}", settings.archive);
}

fn main() {
    let cli = get_cli();
    match cli.command {
        Commands::Collate(settings) => {
            run_collate(*settings);
        },
        Commands::Db(DbCommands::List(settings)) => {
            run_db_list(settings);
        },
        Commands::Db(DbCommands::Install(settings)) => {
            run_db_install(settings);
        }
    }

    info!("Process finished successfully.");
}
