//! Subcommand implementations.

pub mod execute;
pub mod load;
pub mod show;
pub mod translate;

use std::path::{Path, PathBuf};

pub use execute::ExecuteArgs;
pub use load::LoadArgs;
pub use show::ShowArgs;
pub use translate::TranslateArgs;

use crate::error::CliError;

/// Resolve an input path to the files to process.
///
/// A directory yields its regular files in name order, minus hidden files
/// and files with one of the `skip` extensions.
pub fn collect_inputs(path: &Path, skip: &[&str]) -> Result<Vec<PathBuf>, CliError> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let file = entry?.path();
        let hidden = file
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        let skipped = file
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| skip.contains(&e));
        if file.is_file() && !hidden && !skipped {
            files.push(file);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(CliError::NoInput(path.to_path_buf()));
    }
    Ok(files)
}

/// Where the output for `input` goes.
///
/// An explicit output is used as is for a single input and as a directory
/// for a batch; otherwise the output sits next to the input with `suffix`
/// appended.
pub fn output_path(input: &Path, output: Option<&Path>, batch: bool, suffix: &str) -> PathBuf {
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match output {
        Some(output) if batch => output.join(format!("{}{}", file_name, suffix)),
        Some(output) => output.to_path_buf(),
        None => input.with_file_name(format!("{}{}", file_name, suffix)),
    }
}

/// Failure count of a batch run.
#[derive(Debug, Default)]
pub struct Batch {
    total: usize,
    failed: usize,
}

impl Batch {
    /// Record the outcome of one input, reporting a failure on stderr.
    pub fn record<T, E: std::fmt::Display>(&mut self, input: &Path, outcome: Result<T, E>) -> Option<T> {
        self.total += 1;
        match outcome {
            Ok(value) => Some(value),
            Err(e) => {
                self.failed += 1;
                tracing::warn!(input = %input.display(), error = %e, "input failed");
                eprintln!("{}: {}", input.display(), e);
                None
            }
        }
    }

    /// Turn the run into an error if any input failed.
    pub fn finish(self) -> Result<(), CliError> {
        if self.failed > 0 {
            return Err(CliError::Batch {
                failed: self.failed,
                total: self.total,
            });
        }
        Ok(())
    }
}
