
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::data_types::sample_batch::CoverageRecord;
use crate::writers::{delimiter_for, na_or};

/// Writes the per-sample target coverage table
pub struct CoverageTableWriter {
    /// Handle on the writer
    csv_writer: csv::Writer<File>
}

/// Contains all the data written to each row of the coverage table
#[derive(Serialize)]
struct CoverageRow<'a> {
    sample_id: &'a str,
    target: &'a str,
    percent_depth_pass: String,
    median_depth: String
}

impl CoverageTableWriter {
    /// Opens the output table
    /// # Arguments
    /// * `filename` - path to the output, tab-delimited if it ends in .tsv and comma-delimited otherwise
    pub fn new(filename: &Path) -> csv::Result<Self> {
        let csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter_for(filename))
            .from_path(filename)?;
        Ok(Self {
            csv_writer
        })
    }

    /// Writes every record in order and flushes the output.
    /// With no records, only the header is written.
    pub fn write_all(mut self, records: &[CoverageRecord]) -> csv::Result<u64> {
        if records.is_empty() {
            self.csv_writer.write_record(["sample_id", "target", "percent_depth_pass", "median_depth"])?;
        }
        for record in records.iter() {
            let row = CoverageRow {
                sample_id: &record.sample_id,
                target: &record.target,
                percent_depth_pass: na_or(record.percent_depth_pass.as_ref()),
                median_depth: na_or(record.median_depth.as_ref())
            };
            self.csv_writer.serialize(&row)?;
        }
        self.csv_writer.flush()?;
        Ok(records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_coverage() {
        let tmp = tempfile::tempdir().unwrap();
        let out_fn = tmp.path().join("out.coverage.csv");
        let records = vec![
            CoverageRecord {
                sample_id: "s1".to_string(),
                target: "geneA".to_string(),
                percent_depth_pass: Some(99.5),
                median_depth: Some(31.0)
            },
            CoverageRecord {
                sample_id: "s2".to_string(),
                target: "geneA".to_string(),
                percent_depth_pass: None,
                median_depth: Some(6.0)
            },
        ];
        let written = CoverageTableWriter::new(&out_fn).unwrap().write_all(&records).unwrap();
        assert_eq!(written, 2);

        let text = std::fs::read_to_string(&out_fn).unwrap();
        assert_eq!(text, "sample_id,target,percent_depth_pass,median_depth\ns1,geneA,99.5,31\ns2,geneA,NA,6\n");
    }

    #[test]
    fn test_empty_coverage() {
        let tmp = tempfile::tempdir().unwrap();
        let out_fn = tmp.path().join("out.coverage.csv");
        CoverageTableWriter::new(&out_fn).unwrap().write_all(&[]).unwrap();
        let text = std::fs::read_to_string(&out_fn).unwrap();
        assert_eq!(text, "sample_id,target,percent_depth_pass,median_depth\n");
    }
}
