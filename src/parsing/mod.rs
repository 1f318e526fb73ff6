/// Loads the mutation panel database
pub mod mutation_panel;
/// Loads per-sample result reports into row batches
pub mod report_loader;
/// Resolves which samples to collate
pub mod sample_list;
