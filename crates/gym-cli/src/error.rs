//! CLI errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Planner, executor or store failure.
    #[error("{0}")]
    Core(#[from] gym_core::Error),

    /// Plan encoding failure.
    #[error("{0}")]
    Protocol(#[from] gym_proto::Error),

    /// File system failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input path matched no file.
    #[error("no input files under {}", .0.display())]
    NoInput(PathBuf),

    /// Some inputs of a batch failed; the others were processed.
    #[error("{failed} of {total} input(s) failed")]
    Batch { failed: usize, total: usize },
}
