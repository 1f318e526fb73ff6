/*!
# Collation driver
Runs the full collate pass: resolve samples, load their reports, index the mutations of interest,
look up depth, densify, and emit the variants and coverage tables.
Each phase hands an immutable result to the next; nothing is shared across samples except the folded outputs.
*/

use anyhow::{bail, Context};
use derive_builder::Builder;
use indicatif::ProgressIterator;
use log::{info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::data_types::collate_error::CollateError;
use crate::data_types::sample_batch::{CoverageRecord, SampleBatch};
use crate::data_types::variant_record::VariantRecord;
use crate::depth_lookup::{collect_depths, DepthSource};
use crate::parsing::mutation_panel::MutationPanel;
use crate::parsing::report_loader::load_sample_report;
use crate::parsing::sample_list::resolve_samples;
use crate::reconciler::{reconcile, MutationIndex, ReconcileConfig};
use crate::util::progress_bar::get_progress_style;
use crate::writers::coverage_table::CoverageTableWriter;
use crate::writers::variant_table::VariantTableWriter;

/// Output suffix for the variants table
pub const VARIANTS_SUFFIX: &str = ".variants.csv";
/// Output suffix for the coverage table
pub const COVERAGE_SUFFIX: &str = ".coverage.csv";

/// Everything a collate pass needs to know
#[derive(Builder, Clone, Debug)]
#[builder(setter(into))]
pub struct CollateConfig {
    /// Optional file listing one sample per line; otherwise samples are discovered in `report_dir`
    #[builder(default)]
    samples_file: Option<PathBuf>,
    /// Folder holding the per-sample reports
    report_dir: PathBuf,
    /// Report file suffix
    #[builder(default = "\".results.json\".to_string()")]
    report_suffix: String,
    /// Mutation panel database folder
    db_dir: PathBuf,
    /// Mutation panel name
    db_name: String,
    /// Output prefix; tables are written to `<prefix>.variants.csv` and `<prefix>.coverage.csv`
    out_prefix: PathBuf,
    /// Thresholds for synthesized rows
    #[builder(default)]
    reconcile: ReconcileConfig,
    /// Maximum concurrent depth lookups
    #[builder(default = "1")]
    threads: usize
}

impl CollateConfig {
    // getters
    pub fn samples_file(&self) -> Option<&Path> {
        self.samples_file.as_deref()
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    pub fn report_suffix(&self) -> &str {
        &self.report_suffix
    }

    pub fn out_prefix(&self) -> &Path {
        &self.out_prefix
    }

    pub fn variants_filename(&self) -> PathBuf {
        with_suffix(&self.out_prefix, VARIANTS_SUFFIX)
    }

    pub fn coverage_filename(&self) -> PathBuf {
        with_suffix(&self.out_prefix, COVERAGE_SUFFIX)
    }
}

/// Appends a suffix to a path prefix without treating it as an extension
fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut full: OsString = prefix.as_os_str().to_owned();
    full.push(suffix);
    PathBuf::from(full)
}

/// The folded output of all samples, ready to emit
#[derive(Clone, Debug, Default)]
pub struct Collation {
    /// Samples whose report loaded, in order
    loaded_samples: Vec<String>,
    /// Samples skipped because their report was missing
    skipped_samples: Vec<String>,
    /// Observed plus synthesized rows, grouped by sample
    variants: Vec<VariantRecord>,
    /// Coverage rows, grouped by sample
    coverage: Vec<CoverageRecord>
}

impl Collation {
    // getters
    pub fn loaded_samples(&self) -> &[String] {
        &self.loaded_samples
    }

    pub fn skipped_samples(&self) -> &[String] {
        &self.skipped_samples
    }

    pub fn variants(&self) -> &[VariantRecord] {
        &self.variants
    }

    pub fn coverage(&self) -> &[CoverageRecord] {
        &self.coverage
    }
}

/// Loads every sample report, skipping (with a warning) any that are missing.
/// # Errors
/// * if a report exists but cannot be parsed
pub fn load_batches(samples: &[String], report_dir: &Path, report_suffix: &str) -> anyhow::Result<(Vec<SampleBatch>, Vec<String>)> {
    let mut batches = vec![];
    let mut skipped = vec![];
    let style = get_progress_style();
    for sample in samples.iter().progress_with_style(style).with_message("Loading reports") {
        match load_sample_report(sample, report_dir, report_suffix) {
            Ok(batch) => batches.push(batch),
            Err(e) => match e.downcast_ref::<CollateError>() {
                Some(CollateError::MissingSampleReport { .. }) => {
                    warn!("{e}");
                    skipped.push(sample.clone());
                },
                _ => return Err(e)
            }
        }
    }
    Ok((batches, skipped))
}

/// Collates the given samples against a panel; nothing is written here.
/// # Arguments
/// * `samples` - the resolved sample identifiers
/// * `panel` - the loaded mutation panel
/// * `depth_source` - where per-sample depth comes from
/// * `config` - the collate configuration
/// # Errors
/// * if no sample report could be loaded
/// * if mutation identities conflict, or depth lookup fails for any loaded sample
pub fn collate_samples(samples: &[String], panel: &MutationPanel, depth_source: &dyn DepthSource, config: &CollateConfig) -> anyhow::Result<Collation> {
    let (batches, skipped_samples) = load_batches(samples, &config.report_dir, &config.report_suffix)?;
    if batches.is_empty() {
        bail!("None of the {} samples had a report in {:?}", samples.len(), config.report_dir);
    }
    info!("Loaded {} reports, skipped {}.", batches.len(), skipped_samples.len());

    let index = MutationIndex::build(&batches, panel)?;
    let loaded_samples: Vec<String> = batches.iter()
        .map(|b| b.sample_id().to_string())
        .collect();

    let positions = index.positions();
    info!("Looking up depth at {} positions for {} samples...", positions.len(), loaded_samples.len());
    let depths = collect_depths(&loaded_samples, &positions, depth_source, config.threads)?;

    let variants = reconcile(&batches, &index, &depths, config.reconcile);
    let coverage = batches.iter()
        .flat_map(|b| b.coverage().iter().cloned())
        .collect();

    Ok(Collation {
        loaded_samples,
        skipped_samples,
        variants,
        coverage
    })
}

/// Writes both output tables.
/// # Errors
/// * if either file cannot be written
pub fn write_collation(collation: &Collation, config: &CollateConfig) -> anyhow::Result<()> {
    let variants_fn = config.variants_filename();
    info!("Saving variants table to {variants_fn:?}...");
    let num_rows = VariantTableWriter::new(&variants_fn)
        .and_then(|w| w.write_all(collation.variants()))
        .with_context(|| format!("Error while writing {variants_fn:?}:"))?;
    info!("\t{num_rows} variant rows written");

    let coverage_fn = config.coverage_filename();
    info!("Saving coverage table to {coverage_fn:?}...");
    let num_rows = CoverageTableWriter::new(&coverage_fn)
        .and_then(|w| w.write_all(collation.coverage()))
        .with_context(|| format!("Error while writing {coverage_fn:?}:"))?;
    info!("\t{num_rows} coverage rows written");
    Ok(())
}

/// Full collate pass: resolve samples, load the panel, collate, and write the tables.
/// Sample resolution happens first, so an empty cohort aborts before anything is read or written.
/// # Arguments
/// * `config` - the collate configuration
/// * `depth_source` - where per-sample depth comes from
pub fn run_collation(config: &CollateConfig, depth_source: &dyn DepthSource) -> anyhow::Result<Collation> {
    let samples = resolve_samples(config.samples_file(), &config.report_dir, &config.report_suffix)?;
    info!("Found {} samples to collate.", samples.len());

    let panel = MutationPanel::load(&config.db_dir, &config.db_name)?;
    info!("Loaded panel {:?} with {} mutations.", panel.name(), panel.num_mutations());
    if let Some(version) = panel.version() {
        info!("\tPanel version: commit {}, {} ({})", version.commit, version.date, version.author);
    }

    let collation = collate_samples(&samples, &panel, depth_source, config)?;
    write_collation(&collation, config)?;
    Ok(collation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::mutation::GenomePosition;
    use crate::data_types::variant_record::{FilterStatus, Genotype, RecordOrigin};
    use crate::depth_lookup::PositionSet;

    /// In-memory depth, (sample, chrom, pos) -> depth
    struct FixedDepths {
        depths: Vec<(&'static str, &'static str, u64, u64)>
    }

    impl DepthSource for FixedDepths {
        fn sample_depths(&self, sample: &str, positions: &PositionSet) -> anyhow::Result<Vec<(GenomePosition, u64)>> {
            Ok(self.depths.iter()
                .filter(|(s, c, p, _d)| *s == sample && positions.contains(c, *p))
                .map(|(_s, c, p, d)| (GenomePosition::new(*c, *p), *d))
                .collect())
        }
    }

    fn example_depths() -> FixedDepths {
        FixedDepths {
            depths: vec![
                ("sample1", "chr1", 100, 15),
                ("sample2", "chr1", 100, 3),
                ("sample2", "chr1", 200, 25),
            ]
        }
    }

    fn example_config(out_dir: &Path, samples_file: Option<PathBuf>) -> CollateConfig {
        CollateConfigBuilder::default()
            .samples_file(samples_file)
            .report_dir("test_data/example_collate")
            .db_dir("test_data/example_collate/db")
            .db_name("testdb")
            .out_prefix(out_dir.join("cohort"))
            .build()
            .unwrap()
    }

    fn row<'a>(collation: &'a Collation, sample: &str, change: &str) -> &'a VariantRecord {
        let matches: Vec<&VariantRecord> = collation.variants().iter()
            .filter(|r| r.sample_id == sample && r.key.change() == change)
            .collect();
        assert_eq!(matches.len(), 1, "{sample} {change}");
        matches[0]
    }

    #[test]
    fn test_two_sample_scenario() {
        let tmp = tempfile::tempdir().unwrap();
        let config = example_config(tmp.path(), None);
        let collation = run_collation(&config, &example_depths()).unwrap();

        assert_eq!(collation.loaded_samples(), &["sample1".to_string(), "sample2".to_string()]);
        assert!(collation.skipped_samples().is_empty());

        // 2 samples x 3 mutations of interest (mutY and mutZ observed, mutX always reported)
        assert_eq!(collation.variants().len(), 6);

        let s1_y = row(&collation, "sample1", "mutY");
        assert_eq!(s1_y.origin, RecordOrigin::Observed);
        assert_eq!(s1_y.depth, Some(20));

        let s1_x = row(&collation, "sample1", "mutX");
        assert_eq!(s1_x.origin, RecordOrigin::Synthesized);
        assert_eq!((&s1_x.filter, s1_x.genotype), (&FilterStatus::Reference, Genotype::Reference));

        let s2_x = row(&collation, "sample2", "mutX");
        assert_eq!((&s2_x.filter, s2_x.genotype), (&FilterStatus::DepthFail, Genotype::Indeterminate));
        assert_eq!(s2_x.depth, Some(3));

        let s2_y = row(&collation, "sample2", "mutY");
        assert_eq!((&s2_y.filter, s2_y.genotype), (&FilterStatus::Reference, Genotype::Reference));
        assert_eq!(s2_y.db_snp_id.as_deref(), Some("rs200"));

        // the soft-failed call counts as observed for sample1 and is densified for sample2
        let s1_z = row(&collation, "sample1", "mutZ");
        assert_eq!(s1_z.genotype, Genotype::Unset);
        let s2_z = row(&collation, "sample2", "mutZ");
        assert_eq!((&s2_z.filter, s2_z.depth), (&FilterStatus::DepthFail, Some(0)));

        // the panel-only mutation that is not flagged never shows up
        assert!(collation.variants().iter().all(|r| r.key.change() != "mutW"));

        assert_eq!(collation.coverage().len(), 4);
        let variants_text = std::fs::read_to_string(config.variants_filename()).unwrap();
        assert_eq!(variants_text.lines().count(), 7);
        let expected_first = "sample1,chr1,200,rs200,geneA,GENEA01,mutY,c.200C>T,p.Arg67Trp,20,0.95,10,9,pass,missense_variant,1,loss of function";
        assert_eq!(variants_text.lines().nth(1).unwrap(), expected_first);

        let coverage_text = std::fs::read_to_string(config.coverage_filename()).unwrap();
        assert_eq!(coverage_text.lines().nth(1).unwrap(), "sample1,geneA,99.5,31");
    }

    #[test]
    fn test_identical_reruns() {
        let tmp = tempfile::tempdir().unwrap();
        let config = example_config(tmp.path(), None);
        run_collation(&config, &example_depths()).unwrap();
        let first_variants = std::fs::read(config.variants_filename()).unwrap();
        let first_coverage = std::fs::read(config.coverage_filename()).unwrap();

        run_collation(&config, &example_depths()).unwrap();
        assert_eq!(std::fs::read(config.variants_filename()).unwrap(), first_variants);
        assert_eq!(std::fs::read(config.coverage_filename()).unwrap(), first_coverage);
    }

    #[test]
    fn test_missing_sample_report() {
        let tmp = tempfile::tempdir().unwrap();
        let samples_fn = tmp.path().join("samples.txt");
        std::fs::write(&samples_fn, "sample1\nghost\nsample2\n").unwrap();
        let config = example_config(tmp.path(), Some(samples_fn));

        let collation = run_collation(&config, &example_depths()).unwrap();
        assert_eq!(collation.skipped_samples(), &["ghost".to_string()]);
        assert_eq!(collation.loaded_samples().len(), 2);
        assert!(collation.variants().iter().all(|r| r.sample_id != "ghost"));
        assert!(collation.coverage().iter().all(|r| r.sample_id != "ghost"));
        assert_eq!(collation.variants().len(), 6);
    }

    #[test]
    fn test_no_samples_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let empty_dir = tmp.path().join("empty");
        std::fs::create_dir(&empty_dir).unwrap();
        let config = CollateConfigBuilder::default()
            .report_dir(empty_dir)
            .db_dir("test_data/example_collate/db")
            .db_name("testdb")
            .out_prefix(tmp.path().join("cohort"))
            .build()
            .unwrap();

        let err = run_collation(&config, &example_depths()).unwrap_err();
        assert!(matches!(err.downcast_ref::<CollateError>(), Some(CollateError::NoSamplesFound { .. })));
        assert!(!config.variants_filename().exists());
        assert!(!config.coverage_filename().exists());
    }

    #[test]
    fn test_all_reports_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let config = example_config(tmp.path(), None);
        let panel = MutationPanel::default();
        let samples = vec!["ghost1".to_string(), "ghost2".to_string()];
        assert!(collate_samples(&samples, &panel, &example_depths(), &config).is_err());
    }

    #[test]
    fn test_output_names() {
        let config = example_config(Path::new("/tmp/out"), None);
        assert_eq!(config.variants_filename(), PathBuf::from("/tmp/out/cohort.variants.csv"));
        assert_eq!(config.coverage_filename(), PathBuf::from("/tmp/out/cohort.coverage.csv"));
        assert_eq!(with_suffix(Path::new("run.v1"), ".coverage.csv"), PathBuf::from("run.v1.coverage.csv"));
    }
}
