/*!
# Profile result model
The typed JSON document written for every profiled sample (`<sample>.results.json`).
Collation reads these back, so deserialization is lenient: anything beyond the fields
below is ignored, and most fields are optional.
*/

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Version of the result document layout
pub const SCHEMA_VERSION: &str = "0.1.0";
/// The only result type we currently produce
pub const RESULT_TYPE_PROFILE: &str = "Profile";

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_result_type() -> String {
    RESULT_TYPE_PROFILE.to_string()
}

/// Information about the software and panel that generated a result
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Pipeline {
    /// Host-Profiler version
    pub software_version: String,
    /// Panel version metadata, if the panel shipped any
    pub db_version: Option<Map<String, Value>>,
    /// External software used along the way
    #[serde(default)]
    pub software: Vec<Map<String, Value>>
}

/// A single drug association attached to a variant
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct DrugAnnotation {
    pub drug: String,
    /// Everything else the panel recorded for this association
    #[serde(flatten)]
    pub extra: Map<String, Value>
}

/// One variant call as written by the profiler
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct ReportVariant {
    pub chrom: String,
    pub pos: u64,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub alt: Option<String>,
    pub depth: Option<u64>,
    pub freq: Option<f64>,
    pub forward_reads: Option<u64>,
    pub reverse_reads: Option<u64>,
    /// Raw filter label, e.g. "pass" or "soft_fail"
    pub filter: String,
    pub gene_id: Option<String>,
    #[serde(default)]
    pub gene_name: String,
    #[serde(rename = "type")]
    pub variant_type: Option<String>,
    pub change: String,
    pub nucleotide_change: Option<String>,
    pub protein_change: Option<String>,
    /// Free-form annotation maps from the panel, e.g. `db-snp-id` and `description`
    #[serde(default)]
    pub annotation: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drugs: Option<Vec<DrugAnnotation>>
}

impl ReportVariant {
    /// Looks up a key across the annotation maps, where later maps take precedence.
    /// Nulls are treated as absent; non-string values are rendered as JSON text.
    /// # Arguments
    /// * `key` - the annotation key to search for
    pub fn annotation_value(&self, key: &str) -> Option<String> {
        self.annotation.iter().rev()
            .find_map(|ann| ann.get(key))
            .and_then(json_to_text)
    }
}

/// Converts a scalar JSON value into its text form, `None` for null
pub fn json_to_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string())
    }
}

/// Coverage QC for one target region
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct TargetQc {
    pub target: String,
    pub percent_depth_pass: Option<f64>,
    pub median_depth: Option<f64>
}

/// QC block of the result; VCF-derived results have no target coverage
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct QcSummary {
    #[serde(default)]
    pub target_qc: Vec<TargetQc>
}

/// The full per-sample result document
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ProfileResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    #[serde(default)]
    pub pipeline: Pipeline,
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_result_type")]
    pub result_type: String,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub variants: Vec<ReportVariant>,
    #[serde(default)]
    pub fail_variants: Vec<ReportVariant>,
    #[serde(default)]
    pub qc: QcSummary
}

impl ProfileResult {
    /// Assembles a fresh profiling result.
    /// Failed variants and notes start empty; the profiler fills `variants` with everything it reports.
    /// # Arguments
    /// * `id` - the sample identifier, also used as the output prefix
    /// * `software_version` - version string of this tool
    /// * `db_version` - optional panel version metadata
    /// * `variants` - the reported variant calls
    /// * `qc` - coverage QC for the sample
    pub fn new(
        id: String, software_version: String, db_version: Option<Map<String, Value>>,
        variants: Vec<ReportVariant>, qc: QcSummary
    ) -> Self {
        Self {
            schema_version: default_schema_version(),
            pipeline: Pipeline {
                software_version,
                db_version,
                software: vec![]
            },
            id,
            result_type: default_result_type(),
            notes: vec![],
            variants,
            fail_variants: vec![],
            qc
        }
    }
}
