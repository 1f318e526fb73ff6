/*!
# CLI module
Command line interface functionality that is specific to Host-Profiler.
*/

/// The main CLI module that contains the top-level CLI parser and help text
pub mod core;
/// The collate CLI subcommand
pub mod collate;
/// The db CLI subcommands
pub mod db;
