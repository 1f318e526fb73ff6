/*!
# Depth lookup
Collects per-sample sequencing depth at the positions collation cares about.
Depth comes from a `DepthSource`; the production source streams `samtools depth` output for each alignment.
Positions outside the set of interest are dropped while streaming, since whole-genome depth output is large.
*/

use anyhow::Context;
use indicatif::ParallelProgressIterator;
use log::{debug, info};
use rayon::prelude::*;
use rustc_hash::{FxHashMap as HashMap, FxHashSet as HashSet};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::data_types::collate_error::CollateError;
use crate::data_types::mutation::GenomePosition;
use crate::util::progress_bar::get_progress_style;

/// The restricted set of positions we want depth for, indexed by chromosome for cheap streaming checks
#[derive(Clone, Debug, Default)]
pub struct PositionSet {
    lookup: HashMap<String, HashSet<u64>>
}

impl PositionSet {
    /// Adds a position to the set
    pub fn insert(&mut self, position: &GenomePosition) {
        self.lookup.entry(position.chrom().to_string())
            .or_default()
            .insert(position.pos());
    }

    /// Returns true if the given coordinate is a position of interest
    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        self.lookup.get(chrom)
            .map(|positions| positions.contains(&pos))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lookup.values().map(|p| p.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> FromIterator<&'a GenomePosition> for PositionSet {
    fn from_iter<I: IntoIterator<Item = &'a GenomePosition>>(iter: I) -> Self {
        let mut set = PositionSet::default();
        for position in iter {
            set.insert(position);
        }
        set
    }
}

/// Anything that can report depth for a sample at a set of positions
pub trait DepthSource: Sync {
    /// Verifies that the sample can be queried at all; runs for every sample before any lookup starts
    fn check_sample(&self, _sample: &str) -> anyhow::Result<()> {
        Ok(())
    }

    /// Returns the depth at every requested position the source has data for.
    /// Positions with no data may be omitted; they are treated as depth 0.
    fn sample_depths(&self, sample: &str, positions: &PositionSet) -> anyhow::Result<Vec<(GenomePosition, u64)>>;
}

/// Runs `samtools depth` on `<dir>/<sample><suffix>`
#[derive(Clone, Debug)]
pub struct SamtoolsDepth {
    /// Executable to invoke
    executable: PathBuf,
    /// Folder holding the alignments
    alignment_dir: PathBuf,
    /// Alignment file suffix, e.g. ".bam"
    alignment_suffix: String
}

impl SamtoolsDepth {
    /// Constructor
    pub fn new(executable: PathBuf, alignment_dir: PathBuf, alignment_suffix: String) -> Self {
        Self {
            executable,
            alignment_dir,
            alignment_suffix
        }
    }

    /// The alignment file for a sample
    pub fn alignment_path(&self, sample: &str) -> PathBuf {
        self.alignment_dir.join(format!("{sample}{}", self.alignment_suffix))
    }
}

impl DepthSource for SamtoolsDepth {
    fn check_sample(&self, sample: &str) -> anyhow::Result<()> {
        let path = self.alignment_path(sample);
        if !path.is_file() {
            return Err(CollateError::MissingAlignmentFile {
                sample: sample.to_string(),
                path
            }.into());
        }
        Ok(())
    }

    fn sample_depths(&self, sample: &str, positions: &PositionSet) -> anyhow::Result<Vec<(GenomePosition, u64)>> {
        let alignment = self.alignment_path(sample);
        debug!("Running {:?} depth {alignment:?}", self.executable);
        let mut child = Command::new(&self.executable)
            .arg("depth")
            .arg(&alignment)
            .stdout(Stdio::piped())
            .spawn()
            .with_context(|| format!("Error while launching {:?} for {sample}:", self.executable))?;

        let stdout = child.stdout.take()
            .context("depth tool stdout was not captured")?;

        // parse first so the pipe closes before we wait on the child
        let parsed = parse_depth_stream(sample, BufReader::new(stdout), positions);
        let status = child.wait()
            .with_context(|| format!("Error while waiting on depth tool for {sample}:"))?;

        // a parse failure closes the pipe early, so it takes precedence over the exit status
        let depths = parsed?;
        if !status.success() {
            return Err(CollateError::DepthCommandFailed {
                sample: sample.to_string(),
                status
            }.into());
        }
        Ok(depths)
    }
}

/// Parses `chrom pos depth` lines, keeping only positions of interest.
/// # Arguments
/// * `sample` - sample label for error messages
/// * `reader` - the streamed tool output
/// * `positions` - positions of interest
/// # Errors
/// * if reading fails or a line does not have three whitespace-separated fields
pub fn parse_depth_stream<R: BufRead>(sample: &str, reader: R, positions: &PositionSet) -> anyhow::Result<Vec<(GenomePosition, u64)>> {
    let mut depths = vec![];
    for line in reader.lines() {
        let line = line.with_context(|| format!("Error while reading depth output for {sample}:"))?;
        if line.is_empty() {
            continue;
        }

        let malformed = || CollateError::MalformedDepthLine {
            sample: sample.to_string(),
            line: line.clone()
        };
        let mut fields = line.split_whitespace();
        let (Some(chrom), Some(pos), Some(depth), None) = (fields.next(), fields.next(), fields.next(), fields.next()) else {
            return Err(malformed().into());
        };
        let pos: u64 = pos.parse().map_err(|_e| malformed())?;
        if !positions.contains(chrom, pos) {
            continue;
        }
        let depth: u64 = depth.parse().map_err(|_e| malformed())?;
        depths.push((GenomePosition::new(chrom, pos), depth));
    }
    Ok(depths)
}

/// Depth cache keyed by (chrom, pos, sample)
#[derive(Clone, Debug, Default)]
pub struct DepthTable {
    lookup: HashMap<GenomePosition, HashMap<String, u64>>
}

impl DepthTable {
    /// Records a depth; a later value for the same key replaces the earlier one
    pub fn insert(&mut self, position: GenomePosition, sample: &str, depth: u64) {
        self.lookup.entry(position)
            .or_default()
            .insert(sample.to_string(), depth);
    }

    /// Depth for a sample at a position; positions never reported count as 0
    pub fn depth(&self, position: &GenomePosition, sample: &str) -> u64 {
        self.lookup.get(position)
            .and_then(|by_sample| by_sample.get(sample))
            .copied()
            .unwrap_or(0)
    }

    /// Number of cached (position, sample) entries
    pub fn len(&self) -> usize {
        self.lookup.values().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Queries depth for all samples and folds them into one table.
/// Every sample is checked before the first query, so a missing alignment aborts without partial work.
/// Samples are queried on a pool of `threads` workers; results are folded in sample order.
/// # Arguments
/// * `samples` - the samples to query
/// * `positions` - positions of interest
/// * `source` - where depth comes from
/// * `threads` - maximum concurrent queries
/// # Errors
/// * if any sample fails its check or its query
pub fn collect_depths(samples: &[String], positions: &PositionSet, source: &dyn DepthSource, threads: usize) -> anyhow::Result<DepthTable> {
    for sample in samples.iter() {
        source.check_sample(sample)?;
    }

    let mut table = DepthTable::default();
    if positions.is_empty() {
        info!("No positions of interest, skipping depth lookup.");
        return Ok(table);
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .context("Error while building depth lookup thread pool:")?;

    let style = get_progress_style();
    let all_depths: Vec<Vec<(GenomePosition, u64)>> = pool.install(|| {
        samples.par_iter()
            .map(|sample| {
                source.sample_depths(sample, positions)
                    .with_context(|| format!("Error while calculating depth for {sample}:"))
            })
            .progress_with_style(style)
            .with_message("Calculating depth")
            .collect::<anyhow::Result<_>>()
    })?;

    for (sample, depths) in samples.iter().zip(all_depths) {
        debug!("{sample}: {} positions of interest covered", depths.len());
        for (position, depth) in depths {
            table.insert(position, sample, depth);
        }
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Depth source backed by a fixed map, (sample, chrom, pos) -> depth
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

    fn example_positions() -> PositionSet {
        let positions = [GenomePosition::new("chr1", 100), GenomePosition::new("chr1", 200)];
        positions.iter().collect()
    }

    #[test]
    fn test_position_set() {
        let positions = example_positions();
        assert_eq!(positions.len(), 2);
        assert!(positions.contains("chr1", 100));
        assert!(!positions.contains("chr1", 101));
        assert!(!positions.contains("chr2", 100));
        assert!(PositionSet::default().is_empty());
    }

    #[test]
    fn test_parse_depth_stream() {
        let text = "chr1\t99\t5\nchr1\t100\t12\nchr2\t100\t7\nchr1\t200\t3\n";
        let depths = parse_depth_stream("s1", text.as_bytes(), &example_positions()).unwrap();
        assert_eq!(depths, vec![
            (GenomePosition::new("chr1", 100), 12),
            (GenomePosition::new("chr1", 200), 3)
        ]);
    }

    #[test]
    fn test_parse_malformed() {
        let err = parse_depth_stream("s1", "chr1\t100\n".as_bytes(), &example_positions()).unwrap_err();
        assert!(matches!(err.downcast_ref::<CollateError>(), Some(CollateError::MalformedDepthLine { .. })));

        let err = parse_depth_stream("s1", "chr1\tabc\t5\n".as_bytes(), &example_positions()).unwrap_err();
        assert!(matches!(err.downcast_ref::<CollateError>(), Some(CollateError::MalformedDepthLine { .. })));
    }

    #[test]
    fn test_depth_table() {
        let mut table = DepthTable::default();
        let pos = GenomePosition::new("chr1", 100);
        table.insert(pos.clone(), "s1", 15);
        assert_eq!(table.depth(&pos, "s1"), 15);
        assert_eq!(table.depth(&pos, "s2"), 0);
        assert_eq!(table.depth(&GenomePosition::new("chr1", 5), "s1"), 0);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_collect_depths() {
        let source = FixedDepths {
            depths: vec![
                ("s1", "chr1", 100, 25),
                ("s1", "chr1", 150, 99), // not a position of interest
                ("s2", "chr1", 200, 4),
            ]
        };
        let samples = vec!["s1".to_string(), "s2".to_string()];
        for threads in [1, 2] {
            let table = collect_depths(&samples, &example_positions(), &source, threads).unwrap();
            assert_eq!(table.len(), 2);
            assert_eq!(table.depth(&GenomePosition::new("chr1", 100), "s1"), 25);
            assert_eq!(table.depth(&GenomePosition::new("chr1", 200), "s2"), 4);
            assert_eq!(table.depth(&GenomePosition::new("chr1", 150), "s1"), 0);
        }
    }

    #[test]
    fn test_missing_alignment() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("s1.bam"), "").unwrap();
        let source = SamtoolsDepth::new(PathBuf::from("samtools"), tmp.path().to_path_buf(), ".bam".to_string());
        assert_eq!(source.alignment_path("s1"), tmp.path().join("s1.bam"));
        assert!(source.check_sample("s1").is_ok());

        // s2 is missing, so nothing gets queried at all
        let samples = vec!["s1".to_string(), "s2".to_string()];
        let err = collect_depths(&samples, &example_positions(), &source, 1).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CollateError>(),
            Some(CollateError::MissingAlignmentFile { sample, .. }) if sample == "s2"
        ));
    }
}
