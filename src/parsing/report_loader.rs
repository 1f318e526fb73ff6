
use itertools::Itertools;
use log::{debug, warn};
use rustc_hash::FxHashSet as HashSet;
use std::path::{Path, PathBuf};

use crate::data_types::collate_error::CollateError;
use crate::data_types::mutation::{GenomePosition, MutationKey};
use crate::data_types::profile_result::{ProfileResult, ReportVariant};
use crate::data_types::sample_batch::{CoverageRecord, SampleBatch};
use crate::data_types::variant_record::{FilterStatus, Genotype, RecordOrigin, VariantRecord};
use crate::util::json_io::load_json;

/// Builds the expected report path for a sample, `<dir>/<sample><suffix>`
pub fn report_path(dir: &Path, sample: &str, suffix: &str) -> PathBuf {
    dir.join(format!("{sample}{suffix}"))
}

/// Loads a single sample report and flattens it into table rows.
/// # Arguments
/// * `sample` - the sample identifier, stamped on every row
/// * `dir` - directory containing the reports
/// * `suffix` - report file suffix
/// # Errors
/// * `CollateError::MissingSampleReport` if the report does not exist; callers treat this as recoverable
/// * if the report fails to parse
pub fn load_sample_report(sample: &str, dir: &Path, suffix: &str) -> anyhow::Result<SampleBatch> {
    let path = report_path(dir, sample, suffix);
    if !path.is_file() {
        return Err(CollateError::MissingSampleReport {
            sample: sample.to_string(),
            path
        }.into());
    }

    let result: ProfileResult = load_json(&path)?;
    let batch = flatten_result(sample, &result);
    debug!("Loaded {} variants and {} targets for {sample}", batch.variants().len(), batch.coverage().len());
    Ok(batch)
}

/// Converts a parsed result into rows; called variants come before failed ones.
/// A mutation reported more than once keeps only its first row, so a called entry beats a failed one.
/// # Arguments
/// * `sample` - the sample identifier, stamped on every row
/// * `result` - the parsed report
pub fn flatten_result(sample: &str, result: &ProfileResult) -> SampleBatch {
    let coverage = result.qc.target_qc.iter()
        .map(|region| CoverageRecord {
            sample_id: sample.to_string(),
            target: region.target.clone(),
            percent_depth_pass: region.percent_depth_pass,
            median_depth: region.median_depth
        })
        .collect();

    let mut seen: HashSet<MutationKey> = Default::default();
    let mut variants = vec![];
    for variant in result.variants.iter().chain(result.fail_variants.iter()) {
        let record = observed_record(sample, variant);
        if !seen.insert(record.key.clone()) {
            warn!("{sample}: {} reported more than once, keeping the first entry", record.key);
            continue;
        }
        variants.push(record);
    }

    SampleBatch::new(sample.to_string(), variants, coverage)
}

/// Builds a table row from a reported call
fn observed_record(sample: &str, variant: &ReportVariant) -> VariantRecord {
    let filter = FilterStatus::from_label(&variant.filter);
    let genotype = Genotype::from_observed_filter(&filter);

    let drugs = variant.drugs.as_ref()
        .map(|drugs| drugs.iter().map(|d| d.drug.as_str()).join(","))
        .unwrap_or_default();

    VariantRecord {
        sample_id: sample.to_string(),
        position: GenomePosition::new(variant.chrom.clone(), variant.pos),
        key: MutationKey::new(variant.gene_name.clone(), variant.change.clone()),
        db_snp_id: variant.annotation_value("db-snp-id"),
        gene_id: variant.gene_id.clone(),
        nucleotide_change: variant.nucleotide_change.clone(),
        protein_change: variant.protein_change.clone(),
        depth: variant.depth,
        freq: variant.freq,
        forward_reads: variant.forward_reads,
        reverse_reads: variant.reverse_reads,
        filter,
        variant_type: variant.annotation_value("type").or_else(|| variant.variant_type.clone()),
        genotype,
        description: variant.annotation_value("description"),
        drugs,
        origin: RecordOrigin::Observed
    }
}
