/// Command line interface functionality
pub mod cli;
/// Collate driver tying the pipeline phases together
pub mod collate;
/// Contains various shared data types
pub mod data_types;
/// Mutation panel database management
pub mod database;
/// Read depth lookups for mutations that were not called
pub mod depth_lookup;
/// Tooling for parsing input files into meaningful structs / data
pub mod parsing;
/// Builds the mutations of interest and densifies the per-sample calls
pub mod reconciler;
/// Various utility functions that tend to be very generic
pub mod util;
/// All output writers
pub mod writers;
