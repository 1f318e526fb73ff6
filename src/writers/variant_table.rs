
use serde::Serialize;
use std::fs::File;
use std::path::Path;

use crate::data_types::variant_record::VariantRecord;
use crate::writers::{delimiter_for, na_or, MISSING_VALUE};

/// Writes the dense sample-by-mutation table
pub struct VariantTableWriter {
    /// Handle on the writer
    csv_writer: csv::Writer<File>,
    /// Number of rows written so far
    rows_written: u64
}

/// Header of the variants table, in column order
const VARIANT_COLUMNS: [&str; 17] = [
    "sample_id", "chrom", "pos", "db-snp-id", "gene_name", "gene_id", "change", "nucleotide_change",
    "protein_change", "depth", "freq", "forward_reads", "reverse_reads", "filter", "type", "genotype",
    "description"
];

/// The fixed column set of the variants table
#[derive(Serialize)]
struct VariantRow<'a> {
    sample_id: &'a str,
    chrom: &'a str,
    pos: u64,
    #[serde(rename = "db-snp-id")]
    db_snp_id: String,
    gene_name: &'a str,
    gene_id: String,
    change: &'a str,
    nucleotide_change: String,
    protein_change: String,
    depth: String,
    freq: String,
    forward_reads: String,
    reverse_reads: String,
    filter: &'a str,
    #[serde(rename = "type")]
    variant_type: String,
    genotype: &'a str,
    description: String
}

impl<'a> VariantRow<'a> {
    /// Converts a record, filling missing cells with the missing-value marker
    fn new(record: &'a VariantRecord) -> Self {
        Self {
            sample_id: &record.sample_id,
            chrom: record.position.chrom(),
            pos: record.position.pos(),
            db_snp_id: na_or(record.db_snp_id.as_ref()),
            gene_name: record.key.gene_name(),
            gene_id: na_or(record.gene_id.as_ref()),
            change: record.key.change(),
            nucleotide_change: na_or(record.nucleotide_change.as_ref()),
            protein_change: na_or(record.protein_change.as_ref()),
            depth: na_or(record.depth.as_ref()),
            freq: na_or(record.freq.as_ref()),
            forward_reads: na_or(record.forward_reads.as_ref()),
            reverse_reads: na_or(record.reverse_reads.as_ref()),
            filter: record.filter.as_str(),
            variant_type: na_or(record.variant_type.as_ref()),
            genotype: record.genotype.as_field().unwrap_or(MISSING_VALUE),
            description: na_or(record.description.as_ref())
        }
    }
}

impl VariantTableWriter {
    /// Opens the output table
    /// # Arguments
    /// * `filename` - path to the output, tab-delimited if it ends in .tsv and comma-delimited otherwise
    pub fn new(filename: &Path) -> csv::Result<Self> {
        let csv_writer: csv::Writer<File> = csv::WriterBuilder::new()
            .delimiter(delimiter_for(filename))
            .from_path(filename)?;
        Ok(Self {
            csv_writer,
            rows_written: 0
        })
    }

    /// Writes a single record
    pub fn write_record(&mut self, record: &VariantRecord) -> csv::Result<()> {
        self.csv_writer.serialize(VariantRow::new(record))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Writes every record in order and flushes the output.
    /// With no records, only the header is written.
    pub fn write_all(mut self, records: &[VariantRecord]) -> csv::Result<u64> {
        if records.is_empty() {
            self.csv_writer.write_record(VARIANT_COLUMNS)?;
        }
        for record in records.iter() {
            self.write_record(record)?;
        }
        self.csv_writer.flush()?;
        Ok(self.rows_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_types::mutation::{GenomePosition, MutationKey};
    use crate::data_types::variant_record::{FilterStatus, Genotype, RecordOrigin};

    fn example_record(genotype: Genotype, filter: FilterStatus) -> VariantRecord {
        VariantRecord {
            sample_id: "s1".to_string(),
            position: GenomePosition::new("chr1", 100),
            key: MutationKey::new("geneA", "mutX"),
            db_snp_id: Some("rs100".to_string()),
            gene_id: None,
            nucleotide_change: Some(String::new()),
            protein_change: None,
            depth: Some(12),
            freq: Some(0.0),
            forward_reads: None,
            reverse_reads: None,
            filter,
            variant_type: Some("pgx".to_string()),
            genotype,
            description: Some("has, a comma".to_string()),
            drugs: "ignored".to_string(),
            origin: RecordOrigin::Synthesized
        }
    }

    #[test]
    fn test_write_variants() {
        let tmp = tempfile::tempdir().unwrap();
        let out_fn = tmp.path().join("out.variants.csv");
        let records = vec![
            example_record(Genotype::Reference, FilterStatus::Reference),
            example_record(Genotype::Indeterminate, FilterStatus::DepthFail),
            example_record(Genotype::Unset, FilterStatus::SoftFail),
        ];
        let written = VariantTableWriter::new(&out_fn).unwrap().write_all(&records).unwrap();
        assert_eq!(written, 3);

        let text = std::fs::read_to_string(&out_fn).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "sample_id,chrom,pos,db-snp-id,gene_name,gene_id,change,nucleotide_change,protein_change,depth,freq,forward_reads,reverse_reads,filter,type,genotype,description");
        assert_eq!(lines[0], VARIANT_COLUMNS.join(","));
        assert_eq!(lines[1], "s1,chr1,100,rs100,geneA,NA,mutX,,NA,12,0,NA,NA,reference,pgx,0,\"has, a comma\"");
        assert_eq!(lines[2], "s1,chr1,100,rs100,geneA,NA,mutX,,NA,12,0,NA,NA,depth_fail,pgx,NA,\"has, a comma\"");
        assert_eq!(lines[3], "s1,chr1,100,rs100,geneA,NA,mutX,,NA,12,0,NA,NA,soft_fail,pgx,NA,\"has, a comma\"");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_tsv_delimiter() {
        let tmp = tempfile::tempdir().unwrap();
        let out_fn = tmp.path().join("out.variants.tsv");
        let records = vec![example_record(Genotype::Called, FilterStatus::Pass)];
        VariantTableWriter::new(&out_fn).unwrap().write_all(&records).unwrap();
        let text = std::fs::read_to_string(&out_fn).unwrap();
        assert!(text.lines().next().unwrap().starts_with("sample_id\tchrom\tpos\t"));
    }

    #[test]
    fn test_empty_variants() {
        let tmp = tempfile::tempdir().unwrap();
        let out_fn = tmp.path().join("out.variants.csv");
        let written = VariantTableWriter::new(&out_fn).unwrap().write_all(&[]).unwrap();
        assert_eq!(written, 0);
        let text = std::fs::read_to_string(&out_fn).unwrap();
        assert_eq!(text, format!("{}\n", VARIANT_COLUMNS.join(",")));
    }
}
