
use serde::Serialize;

/// Logical identity of a mutation: the gene it lives in and the change string.
/// This is the composite key used to line up calls across samples and the panel.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct MutationKey {
    /// Gene name, e.g. "CYP2D6"
    gene_name: String,
    /// Change string as reported by the profiler, e.g. "c.100C>T"
    change: String
}

impl MutationKey {
    /// Constructor
    pub fn new(gene_name: impl Into<String>, change: impl Into<String>) -> Self {
        Self {
            gene_name: gene_name.into(),
            change: change.into()
        }
    }

    // getters
    pub fn gene_name(&self) -> &str {
        &self.gene_name
    }

    pub fn change(&self) -> &str {
        &self.change
    }
}

impl std::fmt::Display for MutationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.gene_name, self.change)
    }
}

/// Physical identity of a mutation: chromosome and 1-based position.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct GenomePosition {
    /// Chromosome name
    chrom: String,
    /// 1-based position, matching the coordinates reported by depth tools
    pos: u64
}

impl GenomePosition {
    /// Constructor
    pub fn new(chrom: impl Into<String>, pos: u64) -> Self {
        Self {
            chrom: chrom.into(),
            pos
        }
    }

    // getters
    pub fn chrom(&self) -> &str {
        &self.chrom
    }

    pub fn pos(&self) -> u64 {
        self.pos
    }
}

impl std::fmt::Display for GenomePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.chrom, self.pos)
    }
}
