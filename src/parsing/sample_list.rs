
use anyhow::Context;
use log::debug;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::data_types::collate_error::CollateError;
use crate::util::json_io::open_reader;

/// Resolves the sample identifiers to collate.
/// If a samples file is given, it holds one identifier per line (blank lines ignored).
/// Otherwise, every file in `dir` ending with `suffix` is a sample, named by stripping the suffix.
/// Discovered samples are sorted by name so that repeated runs see the same order.
/// # Arguments
/// * `samples_file` - optional file of sample identifiers
/// * `dir` - directory containing the per-sample results
/// * `suffix` - result file suffix, e.g. ".results.json"
/// # Errors
/// * if the samples file or directory cannot be read
/// * `CollateError::NoSamplesFound` if nothing was resolved
pub fn resolve_samples(samples_file: Option<&Path>, dir: &Path, suffix: &str) -> anyhow::Result<Vec<String>> {
    let samples = match samples_file {
        Some(filename) => read_sample_file(filename)?,
        None => discover_samples(dir, suffix)?
    };

    if samples.is_empty() {
        return Err(CollateError::NoSamplesFound { dir: dir.to_path_buf() }.into());
    }
    debug!("Resolved {} samples: {samples:?}", samples.len());
    Ok(samples)
}

/// Reads one sample identifier per line, stripping trailing whitespace
fn read_sample_file(filename: &Path) -> anyhow::Result<Vec<String>> {
    let reader = BufReader::new(open_reader(filename)?);
    let mut samples = vec![];
    for line in reader.lines() {
        let line = line.with_context(|| format!("Error while reading {filename:?}:"))?;
        let sample = line.trim_end();
        if !sample.is_empty() {
            samples.push(sample.to_string());
        }
    }
    Ok(samples)
}

/// Finds all files with the given suffix and strips it off
fn discover_samples(dir: &Path, suffix: &str) -> anyhow::Result<Vec<String>> {
    let mut samples = vec![];
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Error while listing {dir:?}:"))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("Error while listing {dir:?}:"))?;
        let filename = entry.file_name();
        if let Some(sample) = filename.to_str().and_then(|f| f.strip_suffix(suffix)) {
            if !sample.is_empty() {
                samples.push(sample.to_string());
            }
        }
    }
    samples.sort();
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discover_samples() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["s2.results.json", "s1.results.json", "s1.bam", "notes.txt"] {
            fs::write(tmp.path().join(name), "{}").unwrap();
        }
        let samples = resolve_samples(None, tmp.path(), ".results.json").unwrap();
        assert_eq!(samples, vec!["s1".to_string(), "s2".to_string()]);
    }

    #[test]
    fn test_sample_file() {
        let tmp = tempfile::tempdir().unwrap();
        let list = tmp.path().join("samples.txt");
        fs::write(&list, "s3\n\ns1  \ns2\n").unwrap();

        // explicit lists keep their order
        let samples = resolve_samples(Some(&list), tmp.path(), ".results.json").unwrap();
        assert_eq!(samples, vec!["s3".to_string(), "s1".to_string(), "s2".to_string()]);
    }

    #[test]
    fn test_no_samples() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("s1.bam"), "").unwrap();
        let err = resolve_samples(None, tmp.path(), ".results.json").unwrap_err();
        assert!(matches!(err.downcast_ref::<CollateError>(), Some(CollateError::NoSamplesFound { .. })));

        let list = tmp.path().join("empty.txt");
        fs::write(&list, "\n").unwrap();
        let err = resolve_samples(Some(&list), tmp.path(), ".results.json").unwrap_err();
        assert!(matches!(err.downcast_ref::<CollateError>(), Some(CollateError::NoSamplesFound { .. })));
    }
}
