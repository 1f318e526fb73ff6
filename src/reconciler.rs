/*!
# Variant reconciler
Turns the sparse set of per-sample calls into a dense sample-by-mutation table.

The mutations of interest are every (gene, change) observed in any sample, plus every panel mutation flagged
`always_report` that nobody observed. Each sample gets exactly one row per mutation of interest: its own call if it
made one, otherwise a synthesized row. A synthesized row is only evidence of reference when the position was
sequenced to at least the minimum depth; otherwise it is labelled `depth_fail` with an indeterminate genotype.

## Example usage
```rust
use host_profiler::data_types::sample_batch::SampleBatch;
use host_profiler::depth_lookup::DepthTable;
use host_profiler::parsing::mutation_panel::MutationPanel;
use host_profiler::reconciler::{MutationIndex, ReconcileConfigBuilder, reconcile};

// two samples, neither reported anything, and an empty panel
let batches = vec![
    SampleBatch::new("s1".to_string(), vec![], vec![]),
    SampleBatch::new("s2".to_string(), vec![], vec![]),
];
let index = MutationIndex::build(&batches, &MutationPanel::default()).unwrap();
assert_eq!(index.len(), 0);

// nothing of interest means nothing to densify
let config = ReconcileConfigBuilder::default().min_depth(10).build().unwrap();
let rows = reconcile(&batches, &index, &DepthTable::default(), config);
assert!(rows.is_empty());
```
*/

use derive_builder::Builder;
use indexmap::IndexMap;
use log::{debug, info, warn};
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};

use crate::data_types::collate_error::CollateError;
use crate::data_types::mutation::{GenomePosition, MutationKey};
use crate::data_types::sample_batch::SampleBatch;
use crate::data_types::variant_record::{FilterStatus, Genotype, RecordOrigin, VariantRecord};
use crate::depth_lookup::{DepthTable, PositionSet};
use crate::parsing::mutation_panel::{MutationPanel, PanelMutation};

/// Controls how missing calls are labelled
#[derive(Builder, Clone, Copy, Debug)]
#[builder(default)]
pub struct ReconcileConfig {
    /// Depth at or above which an uncalled position counts as reference
    min_depth: u64
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            min_depth: 10
        }
    }
}

impl ReconcileConfig {
    pub fn min_depth(&self) -> u64 {
        self.min_depth
    }
}

/// Where the definition of a mutation of interest came from
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MutationSource {
    /// First observed call across all samples
    Observed,
    /// An `always_report` panel entry nobody observed
    Panel
}

/// Descriptive fields copied onto synthesized rows
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MutationMetadata {
    pub change: String,
    pub db_snp_id: Option<String>,
    pub gene_id: Option<String>,
    pub nucleotide_change: Option<String>,
    pub protein_change: Option<String>,
    pub variant_type: Option<String>,
    pub description: Option<String>
}

impl MutationMetadata {
    /// Copies the descriptive fields of a real call
    fn from_observed(record: &VariantRecord) -> Self {
        Self {
            change: record.key.change().to_string(),
            db_snp_id: record.db_snp_id.clone(),
            gene_id: record.gene_id.clone(),
            nucleotide_change: record.nucleotide_change.clone(),
            protein_change: record.protein_change.clone(),
            variant_type: record.variant_type.clone(),
            description: record.description.clone()
        }
    }

    /// Panel defaults, then any annotation overrides
    fn from_panel(gene: &str, mutation_id: &str, definition: &PanelMutation) -> Self {
        let overlay = |key: &str, default: Option<String>| definition.annotation_value(key).or(default);
        Self {
            change: overlay("change", None).unwrap_or_else(|| mutation_id.to_string()),
            db_snp_id: overlay("db-snp-id", None),
            gene_id: overlay("gene_id", Some(gene.to_string())),
            nucleotide_change: overlay("nucleotide_change", Some(String::new())),
            protein_change: overlay("protein_change", Some(String::new())),
            variant_type: overlay("type", Some(String::new())),
            description: overlay("description", None)
        }
    }
}

/// A mutation that must appear once for every sample
#[derive(Clone, Debug, PartialEq)]
pub struct MutationOfInterest {
    key: MutationKey,
    position: GenomePosition,
    metadata: MutationMetadata,
    source: MutationSource
}

impl MutationOfInterest {
    // getters
    pub fn key(&self) -> &MutationKey {
        &self.key
    }

    pub fn position(&self) -> &GenomePosition {
        &self.position
    }

    pub fn metadata(&self) -> &MutationMetadata {
        &self.metadata
    }

    pub fn source(&self) -> MutationSource {
        self.source
    }
}

/// The mutation-to-position map plus which sample reported which mutation
#[derive(Clone, Debug, Default)]
pub struct MutationIndex {
    /// Mutations of interest; observed ones in first-seen order, then panel ones in panel order
    mutations: IndexMap<MutationKey, MutationOfInterest>,
    /// sample -> mutations it reported (called or failed)
    observed: HashMap<String, HashSet<MutationKey>>
}

impl MutationIndex {
    /// Builds the index from loaded batches and the panel.
    /// Real calls always take precedence over panel definitions of the same mutation.
    /// # Arguments
    /// * `batches` - loaded sample batches, in sample order
    /// * `panel` - the mutation panel
    /// # Errors
    /// * `CollateError::InconsistentMutationIdentity` if one mutation was called at two different positions
    /// * `CollateError::EmptyGenomePositions` if a flagged panel mutation has no coordinates
    pub fn build(batches: &[SampleBatch], panel: &MutationPanel) -> Result<Self, CollateError> {
        let mut mutations: IndexMap<MutationKey, MutationOfInterest> = Default::default();
        let mut observed: HashMap<String, HashSet<MutationKey>> = Default::default();

        for batch in batches.iter() {
            // samples without calls still get densified
            let sample_observed = observed.entry(batch.sample_id().to_string()).or_default();
            for record in batch.variants().iter() {
                match mutations.get(&record.key) {
                    Some(existing) => {
                        if existing.position != record.position {
                            return Err(CollateError::InconsistentMutationIdentity {
                                key: record.key.clone(),
                                first: existing.position.clone(),
                                second: record.position.clone()
                            });
                        }
                    },
                    None => {
                        mutations.insert(record.key.clone(), MutationOfInterest {
                            key: record.key.clone(),
                            position: record.position.clone(),
                            metadata: MutationMetadata::from_observed(record),
                            source: MutationSource::Observed
                        });
                    }
                }
                sample_observed.insert(record.key.clone());
            }
        }
        let num_observed = mutations.len();

        for reportable in panel.reportable_mutations()?.into_iter() {
            if let Some(existing) = mutations.get(&reportable.key) {
                if existing.position != reportable.position {
                    warn!(
                        "Panel places {} at {}, but it was called at {}; keeping the called position",
                        reportable.key, reportable.position, existing.position
                    );
                }
                continue;
            }
            let metadata = MutationMetadata::from_panel(reportable.gene, reportable.mutation_id, reportable.definition);
            mutations.insert(reportable.key.clone(), MutationOfInterest {
                key: reportable.key,
                position: reportable.position,
                metadata,
                source: MutationSource::Panel
            });
        }

        info!(
            "Mutations of interest: {} observed, {} always-report from panel",
            num_observed, mutations.len() - num_observed
        );
        Ok(Self {
            mutations,
            observed
        })
    }

    /// Every position a mutation of interest lives at
    pub fn positions(&self) -> PositionSet {
        self.mutations.values()
            .map(|m| &m.position)
            .collect()
    }

    /// Returns true if the sample reported this mutation itself
    pub fn is_observed(&self, sample: &str, key: &MutationKey) -> bool {
        self.observed.get(sample)
            .map(|keys| keys.contains(key))
            .unwrap_or(false)
    }

    pub fn get(&self, key: &MutationKey) -> Option<&MutationOfInterest> {
        self.mutations.get(key)
    }

    pub fn mutations(&self) -> impl Iterator<Item = &MutationOfInterest> {
        self.mutations.values()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}

/// Builds the row for a sample that did not report a mutation of interest
/// # Arguments
/// * `sample` - the sample identifier
/// * `mutation` - the mutation being densified
/// * `depth` - the sample's depth at the mutation position, 0 if never sequenced
/// * `config` - reconciliation thresholds
pub fn synthesize_record(sample: &str, mutation: &MutationOfInterest, depth: u64, config: ReconcileConfig) -> VariantRecord {
    let (filter, genotype) = if depth >= config.min_depth() {
        (FilterStatus::Reference, Genotype::Reference)
    } else {
        (FilterStatus::DepthFail, Genotype::Indeterminate)
    };

    let metadata = &mutation.metadata;
    VariantRecord {
        sample_id: sample.to_string(),
        position: mutation.position.clone(),
        key: MutationKey::new(mutation.key.gene_name(), metadata.change.as_str()),
        db_snp_id: metadata.db_snp_id.clone(),
        gene_id: metadata.gene_id.clone(),
        nucleotide_change: metadata.nucleotide_change.clone(),
        protein_change: metadata.protein_change.clone(),
        depth: Some(depth),
        freq: Some(0.0),
        forward_reads: None,
        reverse_reads: None,
        filter,
        variant_type: metadata.variant_type.clone(),
        genotype,
        description: metadata.description.clone(),
        drugs: String::new(),
        origin: RecordOrigin::Synthesized
    }
}

/// Produces the dense variant table.
/// Rows are grouped by sample in batch order: the sample's own calls first, then synthesized rows in index order.
/// # Arguments
/// * `batches` - loaded sample batches, in sample order
/// * `index` - the mutation index built from the same batches
/// * `depths` - per-sample depth at the mutation positions
/// * `config` - reconciliation thresholds
pub fn reconcile(batches: &[SampleBatch], index: &MutationIndex, depths: &DepthTable, config: ReconcileConfig) -> Vec<VariantRecord> {
    let mut rows = vec![];
    let mut reference_count = 0;
    let mut depth_fail_count = 0;
    for batch in batches.iter() {
        let sample = batch.sample_id();
        rows.extend(batch.variants().iter().cloned());

        for mutation in index.mutations() {
            if index.is_observed(sample, &mutation.key) {
                continue;
            }
            let depth = depths.depth(&mutation.position, sample);
            let record = synthesize_record(sample, mutation, depth, config);
            match record.filter {
                FilterStatus::Reference => reference_count += 1,
                _ => depth_fail_count += 1
            };
            debug!("{sample}: {} at {} -> {} (depth {depth})", mutation.key, mutation.position, record.filter);
            rows.push(record);
        }
    }
    info!("Synthesized {reference_count} reference rows and {depth_fail_count} depth_fail rows.");
    rows
}
