

use std::str::FromStr;

use crate::data_types::mutation::{GenomePosition, MutationKey};

/// Filter labels that can appear on a row of the variants table.
/// Labels the profiler writes that are not listed here are carried through verbatim.
#[derive(Clone, Debug, Eq, Hash, PartialEq, strum_macros::EnumString)]
pub enum FilterStatus {
    /// Called and passed every threshold
    #[strum(serialize = "pass")]
    Pass,
    /// Called, but below a soft threshold
    #[strum(serialize = "soft_fail")]
    SoftFail,
    /// Called, but below a hard threshold
    #[strum(serialize = "hard_fail")]
    HardFail,
    /// Not called, and the position was not covered well enough to say anything
    #[strum(serialize = "depth_fail")]
    DepthFail,
    /// Not called, and the position was adequately covered
    #[strum(serialize = "reference")]
    Reference,
    /// Any other label from a report
    #[strum(default)]
    Other(String)
}

impl FilterStatus {
    /// Parses a report label; unrecognized labels become `Other`
    pub fn from_label(label: &str) -> Self {
        FilterStatus::from_str(label)
            .unwrap_or_else(|_e| FilterStatus::Other(label.to_string()))
    }

    /// Text for the table cell
    pub fn as_str(&self) -> &str {
        match self {
            FilterStatus::Pass => "pass",
            FilterStatus::SoftFail => "soft_fail",
            FilterStatus::HardFail => "hard_fail",
            FilterStatus::DepthFail => "depth_fail",
            FilterStatus::Reference => "reference",
            FilterStatus::Other(label) => label
        }
    }
}

impl std::fmt::Display for FilterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Genotype column values
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Genotype {
    /// A real call, written as 1
    Called,
    /// Well-covered position with no call, written as 0
    Reference,
    /// Soft-failed call, no genotype assigned
    Unset,
    /// No call and insufficient depth, written as the "NA" sentinel
    Indeterminate
}

impl Genotype {
    /// Genotype of an observed call, derived from its filter
    pub fn from_observed_filter(filter: &FilterStatus) -> Self {
        match filter {
            FilterStatus::SoftFail => Genotype::Unset,
            _ => Genotype::Called
        }
    }

    /// Text for the table cell; `None` means the value is missing
    pub fn as_field(&self) -> Option<&'static str> {
        match self {
            Genotype::Called => Some("1"),
            Genotype::Reference => Some("0"),
            Genotype::Unset => None,
            Genotype::Indeterminate => Some("NA")
        }
    }
}

/// Whether a record came from a report or was inferred during collation
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RecordOrigin {
    Observed,
    Synthesized
}

/// One row of the variants table
#[derive(Clone, Debug, PartialEq)]
pub struct VariantRecord {
    pub sample_id: String,
    pub position: GenomePosition,
    pub key: MutationKey,
    pub db_snp_id: Option<String>,
    pub gene_id: Option<String>,
    pub nucleotide_change: Option<String>,
    pub protein_change: Option<String>,
    pub depth: Option<u64>,
    pub freq: Option<f64>,
    pub forward_reads: Option<u64>,
    pub reverse_reads: Option<u64>,
    pub filter: FilterStatus,
    pub variant_type: Option<String>,
    pub genotype: Genotype,
    pub description: Option<String>,
    /// Comma-joined drug names; empty when there are none
    pub drugs: String,
    pub origin: RecordOrigin
}
