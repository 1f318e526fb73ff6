/*!
# Mutation panel
Loads the panel database the profiler was run against.
The panel lives in `<db_dir>/<name>.dr.json` and maps gene -> mutation -> coordinates and annotations.
An optional `<db_dir>/<name>.version.json` describes the panel release.
*/

use anyhow::Context;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use crate::data_types::collate_error::CollateError;
use crate::data_types::mutation::{GenomePosition, MutationKey};
use crate::data_types::profile_result::json_to_text;
use crate::util::json_io::load_json;

/// File suffix for the panel mutation definitions
pub const PANEL_SUFFIX: &str = ".dr.json";
/// File suffix for the panel version metadata
pub const VERSION_SUFFIX: &str = ".version.json";
/// Annotation key that forces a mutation into every sample's output
pub const ALWAYS_REPORT_KEY: &str = "always_report";

/// Version metadata shipped alongside a panel
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PanelVersion {
    pub name: String,
    #[serde(default)]
    pub commit: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub date: String
}

/// A single mutation definition from the panel
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct PanelMutation {
    pub chromosome: String,
    #[serde(default)]
    pub genome_positions: Vec<u64>,
    #[serde(default)]
    pub annotations: Vec<Map<String, Value>>
}

impl PanelMutation {
    /// Returns true if any annotation flags this mutation for unconditional reporting
    pub fn always_report(&self) -> bool {
        self.annotations.iter().any(|ann| ann.contains_key(ALWAYS_REPORT_KEY))
    }

    /// Returns the last annotation value for a key, later annotations win
    pub fn annotation_value(&self, key: &str) -> Option<String> {
        self.annotations.iter().rev()
            .find_map(|ann| ann.get(key))
            .and_then(json_to_text)
    }
}

/// A panel mutation flagged for unconditional reporting, resolved to its canonical position
#[derive(Clone, Debug, PartialEq)]
pub struct ReportableMutation<'a> {
    pub gene: &'a str,
    pub mutation_id: &'a str,
    pub key: MutationKey,
    pub position: GenomePosition,
    pub definition: &'a PanelMutation
}

/// The loaded panel; gene and mutation order follow the file
#[derive(Clone, Debug, Default)]
pub struct MutationPanel {
    /// Panel name, e.g. "pgx"
    name: String,
    /// Optional release metadata
    version: Option<PanelVersion>,
    /// gene -> mutation id -> definition
    json_db: IndexMap<String, IndexMap<String, PanelMutation>>
}

impl MutationPanel {
    /// Constructor, mostly for building panels in memory
    pub fn new(name: String, version: Option<PanelVersion>, json_db: IndexMap<String, IndexMap<String, PanelMutation>>) -> Self {
        Self {
            name,
            version,
            json_db
        }
    }

    /// Loads a panel by name from the database directory.
    /// # Arguments
    /// * `db_dir` - the database directory
    /// * `name` - the panel name
    /// # Errors
    /// * if the panel definition is missing or fails to parse
    /// * if the version file exists but fails to parse
    pub fn load(db_dir: &Path, name: &str) -> anyhow::Result<Self> {
        let panel_fn = panel_path(db_dir, name);
        let json_db: IndexMap<String, IndexMap<String, PanelMutation>> = load_json(&panel_fn)
            .with_context(|| format!("Error while loading mutation panel {name:?}:"))?;

        let version_fn = version_path(db_dir, name);
        let version = if version_fn.exists() {
            Some(load_json(&version_fn)?)
        } else {
            None
        };

        let panel = Self::new(name.to_string(), version, json_db);
        debug!("Loaded panel {name:?} with {} genes and {} mutations", panel.json_db.len(), panel.num_mutations());
        Ok(panel)
    }

    /// Returns every `always_report` mutation with its canonical (first) position, in panel order.
    /// # Errors
    /// * `CollateError::EmptyGenomePositions` if a flagged mutation has no coordinates
    pub fn reportable_mutations(&self) -> Result<Vec<ReportableMutation<'_>>, CollateError> {
        let mut reportable = vec![];
        for (gene, mutations) in self.json_db.iter() {
            for (mutation_id, definition) in mutations.iter() {
                if !definition.always_report() {
                    continue;
                }
                let first_pos = definition.genome_positions.first()
                    .ok_or_else(|| CollateError::EmptyGenomePositions {
                        gene: gene.clone(),
                        mutation: mutation_id.clone()
                    })?;
                reportable.push(ReportableMutation {
                    gene,
                    mutation_id,
                    key: MutationKey::new(gene.as_str(), mutation_id.as_str()),
                    position: GenomePosition::new(definition.chromosome.clone(), *first_pos),
                    definition
                });
            }
        }
        Ok(reportable)
    }

    pub fn num_mutations(&self) -> usize {
        self.json_db.values().map(|m| m.len()).sum()
    }

    // getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> Option<&PanelVersion> {
        self.version.as_ref()
    }

    pub fn json_db(&self) -> &IndexMap<String, IndexMap<String, PanelMutation>> {
        &self.json_db
    }
}

/// Path of the panel definition file
pub fn panel_path(db_dir: &Path, name: &str) -> PathBuf {
    db_dir.join(format!("{name}{PANEL_SUFFIX}"))
}

/// Path of the panel version file
pub fn version_path(db_dir: &Path, name: &str) -> PathBuf {
    db_dir.join(format!("{name}{VERSION_SUFFIX}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn example_db_dir() -> PathBuf {
        PathBuf::from("test_data/example_collate/db")
    }

    #[test]
    fn test_load_example_panel() {
        let panel = MutationPanel::load(&example_db_dir(), "testdb").unwrap();
        assert_eq!(panel.name(), "testdb");
        assert_eq!(panel.num_mutations(), 3);
        assert_eq!(panel.version().unwrap().commit, "abc1234");

        // gene order follows the file, which is not alphabetical
        let genes: Vec<&str> = panel.json_db().keys().map(|g| g.as_str()).collect();
        assert_eq!(genes, vec!["geneA", "geneB"]);

        let reportable = panel.reportable_mutations().unwrap();
        assert_eq!(reportable.len(), 1);
        assert_eq!(reportable[0].key, MutationKey::new("geneA", "mutX"));
        assert_eq!(reportable[0].position, GenomePosition::new("chr1", 100));
        assert_eq!(reportable[0].definition.annotation_value("db-snp-id").as_deref(), Some("rs100"));
    }

    #[test]
    fn test_missing_panel() {
        assert!(MutationPanel::load(&example_db_dir(), "nope").is_err());
    }

    #[test]
    fn test_empty_positions() {
        let definition: PanelMutation = serde_json::from_value(json!({
            "chromosome": "chr1",
            "genome_positions": [],
            "annotations": [{"always_report": true}]
        })).unwrap();
        assert!(definition.always_report());

        let mut mutations = IndexMap::new();
        mutations.insert("mutX".to_string(), definition);
        let mut json_db = IndexMap::new();
        json_db.insert("geneA".to_string(), mutations);
        let panel = MutationPanel::new("mem".to_string(), None, json_db);

        let err = panel.reportable_mutations().unwrap_err();
        assert!(matches!(err, CollateError::EmptyGenomePositions { .. }));
    }

    #[test]
    fn test_panel_version() {
        let version = PanelVersion {
            name: "testdb".to_string(),
            commit: "abc".to_string(),
            ..Default::default()
        };
        let panel = MutationPanel::new("testdb".to_string(), Some(version.clone()), Default::default());
        assert_eq!(panel.version(), Some(&version));
        assert!(MutationPanel::default().version().is_none());
    }
}
