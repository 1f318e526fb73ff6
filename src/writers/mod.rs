/*!
# Writers module
Contains the logic for writing the collated output tables.
*/
/// Generates the per-sample target coverage table
pub mod coverage_table;
/// Generates the dense sample-by-mutation variants table
pub mod variant_table;

use std::path::Path;

/// Marker written for any missing cell
pub const MISSING_VALUE: &str = "NA";

/// Tab for ".tsv" outputs, comma for everything else
pub fn delimiter_for(filename: &Path) -> u8 {
    if filename.extension().unwrap_or_default() == "tsv" {
        b'\t'
    } else {
        b','
    }
}

/// Renders an optional cell, substituting the missing-value marker
pub fn na_or<T: std::fmt::Display>(value: Option<&T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => MISSING_VALUE.to_string()
    }
}
