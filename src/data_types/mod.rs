/// Typed failures raised during collation
pub mod collate_error;
/// Mutation identity keys, logical and physical
pub mod mutation;
/// The per-sample JSON result document
pub mod profile_result;
/// Per-sample batches of loaded rows, plus coverage rows
pub mod sample_batch;
/// Variant table rows along with filter and genotype labels
pub mod variant_record;
