//! Bulk loading of tab-separated triple files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use gym_proto::{codec, Graph};

use super::VpStore;
use crate::error::Error;

/// Summary of a load run.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Lines stored as triples (including repeats of stored triples).
    pub triples: usize,
    /// Lines that were neither triples nor comments, or whose predicate
    /// collides with another predicate's table.
    pub skipped: usize,
    /// Statistics of the store after loading.
    pub graph: Graph,
}

impl LoadReport {
    /// Persist the statistics as a statistics file.
    pub fn write_statistics(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let bytes = codec::encode_stats(&self.graph)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

/// Loads `subject \t predicate \t object` lines into a [`VpStore`].
pub struct Loader<'a> {
    store: &'a VpStore,
}

impl<'a> Loader<'a> {
    pub fn new(store: &'a VpStore) -> Self {
        Self { store }
    }

    /// Load a triple file.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<LoadReport, Error> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::Input(format!("cannot read {}: {}", path.display(), e)))?;
        let report = self.load_reader(BufReader::new(file))?;

        tracing::info!(
            path = %path.display(),
            triples = report.triples,
            skipped = report.skipped,
            tables = report.graph.tables.len(),
            "triples loaded"
        );
        Ok(report)
    }

    /// Load triples from any buffered reader.
    ///
    /// Blank lines and `#` comments are ignored, a trailing ` .` is
    /// tolerated, and lines without exactly three fields are skipped. So are
    /// triples whose predicate collides with a table already in use.
    pub fn load_reader<R: BufRead>(&self, reader: R) -> Result<LoadReport, Error> {
        let mut report = LoadReport::default();

        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match parse_line(line) {
                Some((s, p, o)) => match self.store.insert(s, p, o) {
                    Ok(_) => report.triples += 1,
                    Err(e @ Error::TableCollision { .. }) => {
                        tracing::warn!(line = number + 1, error = %e, "skipping triple");
                        report.skipped += 1;
                    }
                    Err(e) => return Err(e),
                },
                None => {
                    tracing::debug!(line = number + 1, "skipping malformed triple line");
                    report.skipped += 1;
                }
            }
        }

        self.store.flush()?;
        report.graph = self.store.statistics()?;
        Ok(report)
    }
}

fn parse_line(line: &str) -> Option<(&str, &str, &str)> {
    let line = line
        .strip_suffix(" .")
        .or_else(|| line.strip_suffix("\t."))
        .unwrap_or(line);
    let mut fields = line.split('\t').map(str::trim);

    let (s, p, o) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() || s.is_empty() || p.is_empty() || o.is_empty() {
        return None;
    }
    Some((s, p, o))
}
