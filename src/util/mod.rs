
/// Helper functions for read/writing (optionally gzipped) JSON via serde
pub mod json_io;
/// Helper functions for generating the progress bars
pub mod progress_bar;
