
use crate::data_types::variant_record::VariantRecord;

/// One row of the coverage table
#[derive(Clone, Debug, PartialEq)]
pub struct CoverageRecord {
    pub sample_id: String,
    pub target: String,
    pub percent_depth_pass: Option<f64>,
    pub median_depth: Option<f64>
}

/// Everything loaded from a single sample report.
/// Batches are immutable once built; the collation driver folds them in sample order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SampleBatch {
    /// Sample identifier
    sample_id: String,
    /// Called variants followed by failed variants, in report order
    variants: Vec<VariantRecord>,
    /// Target coverage rows in report order
    coverage: Vec<CoverageRecord>
}

impl SampleBatch {
    /// Constructor
    pub fn new(sample_id: String, variants: Vec<VariantRecord>, coverage: Vec<CoverageRecord>) -> Self {
        Self {
            sample_id,
            variants,
            coverage
        }
    }

    // getters
    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn variants(&self) -> &[VariantRecord] {
        &self.variants
    }

    pub fn coverage(&self) -> &[CoverageRecord] {
        &self.coverage
    }
}
