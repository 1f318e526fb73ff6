
use std::path::PathBuf;

use crate::data_types::mutation::{GenomePosition, MutationKey};

/// Domain failures raised while collating sample reports.
/// Only `MissingSampleReport` is recoverable; the rest terminate the run.
#[derive(thiserror::Error, Debug)]
pub enum CollateError {
    #[error("no samples found in directory: {dir:?}")]
    NoSamplesFound { dir: PathBuf },
    #[error("can't find report for sample {sample}: {path:?}")]
    MissingSampleReport { sample: String, path: PathBuf },
    #[error("can't find alignment file for sample {sample}: {path:?}")]
    MissingAlignmentFile { sample: String, path: PathBuf },
    #[error("mutation {key} maps to both {first} and {second}; are samples profiled with different panel versions?")]
    InconsistentMutationIdentity { key: MutationKey, first: GenomePosition, second: GenomePosition },
    #[error("panel mutation {gene}:{mutation} has no genome positions")]
    EmptyGenomePositions { gene: String, mutation: String },
    #[error("depth tool exited with {status} for sample {sample}")]
    DepthCommandFailed { sample: String, status: std::process::ExitStatus },
    #[error("malformed depth line for sample {sample}: {line:?}")]
    MalformedDepthLine { sample: String, line: String },
    #[error("unknown archive format: {path:?}")]
    UnknownArchiveFormat { path: PathBuf }
}

impl CollateError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> exitcode::ExitCode {
        match self {
            CollateError::NoSamplesFound { .. } |
            CollateError::InconsistentMutationIdentity { .. } |
            CollateError::EmptyGenomePositions { .. } |
            CollateError::MalformedDepthLine { .. } => exitcode::DATAERR,
            CollateError::MissingSampleReport { .. } |
            CollateError::MissingAlignmentFile { .. } |
            CollateError::DepthCommandFailed { .. } |
            CollateError::UnknownArchiveFormat { .. } => exitcode::IOERR
        }
    }
}

/// Exit code for any collate failure; untyped failures are treated as I/O problems
pub fn exit_code_for(error: &anyhow::Error) -> exitcode::ExitCode {
    match error.downcast_ref::<CollateError>() {
        Some(e) => e.exit_code(),
        None => exitcode::IOERR
    }
}
